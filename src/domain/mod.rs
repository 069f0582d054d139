// Domain layer: catalog records, view models and the ports to hosted services.
// Nothing here talks to the network; adapters implement the ports.

pub mod model;
pub mod ports;
pub mod view;

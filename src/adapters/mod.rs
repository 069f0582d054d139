// Adapters layer: concrete implementations of the domain ports against the
// hosted services (Firestore, Firebase Auth, Cloudinary) plus an in-process store.

pub mod cloudinary;
pub mod firestore;
pub mod identity;
pub mod memory;

mod remote;

pub use cloudinary::CloudinaryHost;
pub use firestore::FirestoreStore;
pub use identity::FirebaseIdentity;
pub use memory::MemoryStore;

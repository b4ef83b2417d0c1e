pub use super::episodes::Entity as Episodes;
pub use super::meta::Entity as Meta;
pub use super::shows::Entity as Shows;

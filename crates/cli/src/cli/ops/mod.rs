pub mod get;
pub mod init;
pub mod list;
pub mod meta;
pub mod put;
pub mod serve;
pub mod version;

pub use get::Get;
pub use init::Init;
pub use list::List;
pub use meta::Meta;
pub use put::Put;
pub use serve::Serve;
pub use version::Version;

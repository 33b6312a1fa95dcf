pub mod cat;
pub mod copy;
pub mod empty;
pub mod exists;
pub mod get;
pub mod ls;
pub mod put;
pub mod rm;
pub mod stat;
pub mod url;

pub use cat::Cat;
pub use copy::Copy;
pub use empty::Empty;
pub use exists::Exists;
pub use get::Get;
pub use ls::Ls;
pub use put::Put;
pub use rm::Rm;
pub use stat::Stat;
pub use url::Url;

//! Concrete `Source` adapters.

pub mod docker;
pub mod file;
pub mod stdin;

pub use docker::DockerSource;
pub use file::FileSource;
pub use stdin::StdinSource;

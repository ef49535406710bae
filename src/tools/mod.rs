pub mod packager;
pub mod runner;

pub use packager::ZipPackager;
pub use runner::ProcessTestRunner;

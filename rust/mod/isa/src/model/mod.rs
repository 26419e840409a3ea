mod access;
mod investigation;
mod project;
mod publish;
mod study;

pub use access::*;
pub use investigation::*;
pub use project::*;
pub use publish::*;
pub use study::*;

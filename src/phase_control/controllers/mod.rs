mod abort;
mod descend;
mod land;
mod seek;

pub use abort::AbortController;
pub use descend::DescendController;
pub use land::LandController;
pub use seek::SeekController;

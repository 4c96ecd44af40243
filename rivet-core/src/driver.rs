use crate::{Executor, Result};

/// Executor that can be opened from a connection URL.
pub trait Backend: Executor + Sized + 'static {
    /// Open a connection to the given URL.
    fn connect(url: &str) -> Result<Self>;
}

pub trait Driver {
    type Backend: Backend;

    /// Scheme prefix accepted by `connect`, e.g. `sqlite`.
    const NAME: &'static str;

    fn get_instance() -> Self;

    fn connect(&self, url: &str) -> Result<Self::Backend> {
        <Self::Backend as Backend>::connect(url)
    }
}

#[cfg(test)]
#[allow(unused_imports)]
pub(crate) use std::{println as debug, println as info, println as warn};

#[cfg(not(test))]
#[allow(unused_imports)]
pub(crate) use log::{debug, info, warn};

/// Types that can write a summary of themselves to the log.
pub trait Log {
    fn log(&self);
}

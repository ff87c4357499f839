mod entry;
mod map_fs;
#[cfg(unix)]
mod posix_fs;
mod std_fs;

pub use map_fs::MapFS;
#[cfg(unix)]
pub use posix_fs::PosixFS;
pub use std_fs::StdFS;

cfg_if::cfg_if! {
    if #[cfg(unix)] {
        /// Backend compiled in for the current target.
        pub type NativeFS = PosixFS;
    } else {
        /// Backend compiled in for the current target.
        pub type NativeFS = StdFS;
    }
}

//! Emit the binary class file format
//!
//! Everything in here writes straight into a [`ByteSink`]. Sizes which precede the data they
//! describe (counts and lengths) are reserved and patched later using the [`section`] framing.
//!
//! [0]: https://docs.oracle.com/javase/specs/jvms/se15/html/jvms-4.html

mod attribute;
mod byte_sink;
mod class;
mod constants;
mod member;
pub mod section;
mod serialize;
mod settings;
mod version;

pub use attribute::*;
pub use byte_sink::*;
pub use class::*;
pub use constants::*;
pub use member::*;
pub use section::{PendingField, SectionHandle, SectionKind};
pub use serialize::*;
pub use settings::*;
pub use version::*;

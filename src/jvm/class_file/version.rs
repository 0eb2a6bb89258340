use super::{ByteSink, Serialize};
use crate::jvm::Error;

/// Version of the class file, which is used to verify that the JVM has the
/// necessary features to interpret the class
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub struct Version {
    pub minor_version: u16,
    pub major_version: u16,
}

impl Version {
    /// JVM class file version corresponding to Java SE 8 (released March 2014)
    pub const JAVA8: Version = Version {
        minor_version: 0,
        major_version: 52,
    };

    /// JVM class file version corresponding to Java SE 11 (released September 2018)
    pub const JAVA11: Version = Version {
        minor_version: 0,
        major_version: 55,
    };

    /// JVM class file version corresponding to Java SE 17 (released September 2021)
    pub const JAVA17: Version = Version {
        minor_version: 0,
        major_version: 61,
    };
}

impl Default for Version {
    fn default() -> Version {
        Version::JAVA8
    }
}

impl Serialize for Version {
    fn serialize(&self, sink: &mut ByteSink) -> Result<(), Error> {
        self.minor_version.serialize(sink)?;
        self.major_version.serialize(sink)?;
        Ok(())
    }
}

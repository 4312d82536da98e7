//! Runtime permission capabilities

use std::fmt;

/// First API level where shared media must go through the index
pub const API_LEVEL_Q: u32 = 29;

/// First API level with granular media permissions
pub const API_LEVEL_TIRAMISU: u32 = 33;

/// Permission a transfer needs before touching shared storage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Broad storage write, older platforms
    WriteExternalStorage,
    /// Scoped media read, newer platforms
    ReadMediaImages,
}

impl Capability {
    /// Capability required on a platform, by a single version threshold
    pub fn for_api_level(api_level: u32) -> Self {
        if api_level < API_LEVEL_TIRAMISU {
            Capability::WriteExternalStorage
        } else {
            Capability::ReadMediaImages
        }
    }

    /// Opaque identifier understood by the permission subsystem
    pub fn id(&self) -> &'static str {
        match self {
            Capability::WriteExternalStorage => "android.permission.WRITE_EXTERNAL_STORAGE",
            Capability::ReadMediaImages => "android.permission.READ_MEDIA_IMAGES",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        [Capability::WriteExternalStorage, Capability::ReadMediaImages]
            .into_iter()
            .find(|c| c.id() == id)
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

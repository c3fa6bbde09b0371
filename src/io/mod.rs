//! Reading and writing of `crysym` files.

use std::fmt;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use anyhow::{self, ensure, format_err};
use bincode;
use log;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_yaml;

pub(crate) mod format;


/// An enumerated type for `crysym` file types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CrySymFileType {
    /// Variant for binary files containing space-group detection results.
    Sgd,

    /// Variant for binary files containing crystal symmetrisation results.
    Sym,
}

impl CrySymFileType {
    /// Returns the extension of the file type.
    pub fn ext(&self) -> String {
        match self {
            CrySymFileType::Sgd => "crysym.sgd".to_string(),
            CrySymFileType::Sym => "crysym.sym".to_string(),
        }
    }
}

impl fmt::Display for CrySymFileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CrySymFileType::Sgd => write!(f, "space-group detection result"),
            CrySymFileType::Sym => write!(f, "crystal symmetrisation result"),
        }
    }
}

/// The tag opening every `crysym` binary file.
const BINARY_MAGIC: [u8; 8] = *b"CRYSYM\0\x01";

/// The header following the tag of a `crysym` binary file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
struct CrySymBinaryHeader {
    file_type: CrySymFileType,
    version: String,
}

impl CrySymBinaryHeader {
    fn new(file_type: CrySymFileType) -> Self {
        Self {
            file_type,
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// Checks that the header announces a file of the expected type.
    fn validate(&self, expected: CrySymFileType) -> Result<(), anyhow::Error> {
        ensure!(
            self.file_type == expected,
            "Expected a {expected} file, but found a {} file.",
            self.file_type
        );
        if self.version != env!("CARGO_PKG_VERSION") {
            log::warn!(
                "Binary file written by crysym {}, read by crysym {}.",
                self.version,
                env!("CARGO_PKG_VERSION")
            );
        }
        Ok(())
    }
}

/// Reads a `crysym` binary file and deserialises it into an appropriate structure.
///
/// # Arguments
///
/// * `name` - The name of the file to be read in (without `crysym`-specific extensions).
/// * `file_type` - The type of the `crysym` file to be read in.
///
/// # Returns
///
/// A `Result` containing the structure deserialised from the read-in file.
///
/// # Errors
///
/// Errors if the file cannot be opened, if its header does not announce a `crysym` file of type
/// `file_type`, or if its payload cannot be deserialised.
pub fn read_crysym_binary<T, P: AsRef<Path>>(
    name: P,
    file_type: CrySymFileType,
) -> Result<T, anyhow::Error>
where
    T: DeserializeOwned,
{
    let mut path = name.as_ref().to_path_buf();
    path.set_extension(file_type.ext());
    let mut reader = BufReader::new(
        File::open(&path).map_err(|err| format_err!("{}: {err}", path.display()))?,
    );
    let magic: [u8; 8] = bincode::deserialize_from(&mut reader).map_err(|err| format_err!(err))?;
    ensure!(
        magic == BINARY_MAGIC,
        "Not a `crysym` binary file: unrecognised tag in {}.",
        path.display()
    );
    let header: CrySymBinaryHeader =
        bincode::deserialize_from(&mut reader).map_err(|err| format_err!(err))?;
    header.validate(file_type)?;
    bincode::deserialize_from(&mut reader).map_err(|err| format_err!(err))
}

/// Serialises a structure and writes into a `crysym` binary file, after a header recording the
/// file type and the `crysym` version.
///
/// # Arguments
///
/// * `name` - The name of the file to be written (without `crysym`-specific extensions).
/// * `file_type` - The type of the `crysym` file to be written.
///
/// # Returns
///
/// A `Result` indicating if the serialisation and writing processes have been successful.
pub fn write_crysym_binary<T, P: AsRef<Path>>(
    name: P,
    file_type: CrySymFileType,
    value: &T,
) -> Result<(), anyhow::Error>
where
    T: Serialize,
{
    let mut path = name.as_ref().to_path_buf();
    path.set_extension(file_type.ext());
    let mut writer = BufWriter::new(File::create(path)?);
    bincode::serialize_into(&mut writer, &BINARY_MAGIC).map_err(|err| format_err!(err))?;
    bincode::serialize_into(&mut writer, &CrySymBinaryHeader::new(file_type))
        .map_err(|err| format_err!(err))?;
    bincode::serialize_into(&mut writer, value).map_err(|err| format_err!(err))?;
    writer.flush()?;
    Ok(())
}

/// Trait for results that are saved to and loaded from `crysym` binary files of a fixed type.
pub trait CrySymFile: Serialize + DeserializeOwned {
    /// The type of the files holding this result.
    const FILE_TYPE: CrySymFileType;

    /// Saves the result to `name` with the extension of [`Self::FILE_TYPE`].
    fn save<P: AsRef<Path>>(&self, name: P) -> Result<(), anyhow::Error> {
        write_crysym_binary(name, Self::FILE_TYPE, self)
    }

    /// Loads a result from `name` with the extension of [`Self::FILE_TYPE`].
    ///
    /// # Errors
    ///
    /// Errors if the file holds a result of another type.
    fn load<P: AsRef<Path>>(name: P) -> Result<Self, anyhow::Error> {
        read_crysym_binary(name, Self::FILE_TYPE)
    }
}

/// Reads a `crysym` configuration YAML file and deserialises it into an appropriate structure.
///
/// # Arguments
///
/// * `name` - The name of the file to be read in (with its `.yml` or `.yaml` extension).
///
/// # Returns
///
/// A `Result` containing the structure deserialised from the read-in file.
pub fn read_crysym_yaml<T, P: AsRef<Path>>(name: P) -> Result<T, anyhow::Error>
where
    T: DeserializeOwned,
{
    let mut reader = BufReader::new(File::open(name).map_err(|err| format_err!(err))?);
    serde_yaml::from_reader(&mut reader).map_err(|err| format_err!(err))
}

/// Serialises a structure and writes into a `crysym` YAML file.
///
/// # Arguments
///
/// * `name` - The name of the YAML file to be written (without extensions). The resulting file
/// will have the `.yml` extension.
///
/// # Returns
///
/// A `Result` indicating if the serialisation and writing processes have been successful.
pub fn write_crysym_yaml<T, P: AsRef<Path>>(name: P, value: &T) -> Result<(), anyhow::Error>
where
    T: Serialize,
{
    let mut path = name.as_ref().to_path_buf();
    path.set_extension("yml");
    let mut writer = BufWriter::new(File::create(path)?);
    serde_yaml::to_writer(&mut writer, value).map_err(|err| format_err!(err))
}

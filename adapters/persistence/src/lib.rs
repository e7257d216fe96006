#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Persistence adapter for clearway grid layouts.
//!
//! Only the closed/open layout is stored. The grid is cut into 8x8 tiles and
//! each tile is packed into a 64-bit mask (see [`TileRecord`]); clearance is
//! always rebuilt by the world after loading. Save files carry a short header
//! followed by the bincode encoding of [`SaveFile`], and are replaced
//! atomically so an interrupted write never corrupts the previous save.

mod layout_transfer;

use std::{
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
};

use clearway_core::{GridView, TileRecord, TILE_SIDE};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

pub use layout_transfer::{LayoutString, LayoutTransferError, LAYOUT_HEADER};

/// Magic bytes opening every save file.
pub const SAVE_MAGIC: [u8; 4] = *b"CLWY";

/// Save format revision written by this crate.
pub const SAVE_VERSION: u16 = 1;

const HEADER_LEN: usize = SAVE_MAGIC.len() + std::mem::size_of::<u16>();

/// Closed-cell layout of a whole grid.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveFile {
    /// Side length of the grid the layout was captured from.
    pub side: u32,
    /// Tile masks, applied in order when loading.
    pub tiles: Vec<TileRecord>,
}

impl SaveFile {
    /// Captures every tile of the grid, row of tiles by row of tiles.
    pub fn capture(view: &GridView<'_>) -> Result<Self, PersistenceError> {
        let side = view.side();
        check_tile_side(side)?;

        let tiles_per_side = side / TILE_SIDE;
        let mut tiles = Vec::with_capacity((tiles_per_side * tiles_per_side) as usize);
        for tile_y in 0..tiles_per_side {
            for tile_x in 0..tiles_per_side {
                tiles.push(TileRecord::capture(view, tile_x, tile_y));
            }
        }

        Ok(Self { side, tiles })
    }

    /// Ensures the layout targets a grid with the expected side length.
    pub fn check_side(&self, expected: u32) -> Result<(), PersistenceError> {
        if self.side == expected {
            Ok(())
        } else {
            Err(PersistenceError::SideMismatch {
                expected,
                found: self.side,
            })
        }
    }

    fn validate(&self) -> Result<(), PersistenceError> {
        check_tile_side(self.side)?;
        match self.tiles.iter().find(|tile| !tile.fits(self.side)) {
            Some(tile) => Err(PersistenceError::TileOutOfBounds {
                tile_x: tile.tile_x,
                tile_y: tile.tile_y,
            }),
            None => Ok(()),
        }
    }
}

fn check_tile_side(side: u32) -> Result<(), PersistenceError> {
    if side == 0 || side % TILE_SIDE != 0 {
        return Err(PersistenceError::UnsupportedGridSide(side));
    }
    Ok(())
}

/// Errors raised while encoding, decoding, reading, or writing layouts.
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// The grid side length cannot be split into whole tiles.
    #[error("grid side {0} is not a positive multiple of 8")]
    UnsupportedGridSide(u32),
    /// A tile record addressed a tile outside the saved grid.
    #[error("tile ({tile_x}, {tile_y}) lies outside the saved grid")]
    TileOutOfBounds {
        /// Tile column of the offending record.
        tile_x: u32,
        /// Tile row of the offending record.
        tile_y: u32,
    },
    /// The layout was captured from a grid of a different size.
    #[error("layout is for a {found}x{found} grid, expected {expected}x{expected}")]
    SideMismatch {
        /// Side length of the grid being loaded into.
        expected: u32,
        /// Side length recorded in the layout.
        found: u32,
    },
    /// The data ended before the header was complete.
    #[error("save data is truncated")]
    Truncated,
    /// The data does not start with the save magic.
    #[error("save data is not a clearway layout")]
    BadMagic,
    /// The save was written by an unknown format revision.
    #[error("save format version {0} is not supported")]
    UnsupportedVersion(u16),
    /// The payload could not be decoded.
    #[error("could not decode layout payload: {0}")]
    Decode(#[from] bincode::Error),
    /// Reading or writing the file failed.
    #[error("i/o error on {path}: {source}")]
    Io {
        /// File being read or written.
        path: PathBuf,
        /// Underlying operating system error.
        #[source]
        source: std::io::Error,
    },
}

/// Encodes a layout into the binary save format.
pub fn encode(save: &SaveFile) -> Result<Vec<u8>, PersistenceError> {
    save.validate()?;
    let payload = bincode::serialize(save)?;
    let mut bytes = Vec::with_capacity(HEADER_LEN + payload.len());
    bytes.extend_from_slice(&SAVE_MAGIC);
    bytes.extend_from_slice(&SAVE_VERSION.to_le_bytes());
    bytes.extend_from_slice(&payload);
    Ok(bytes)
}

/// Decodes a layout previously produced by [`encode`].
pub fn decode(bytes: &[u8]) -> Result<SaveFile, PersistenceError> {
    if bytes.len() < HEADER_LEN {
        return Err(PersistenceError::Truncated);
    }
    let (header, payload) = bytes.split_at(HEADER_LEN);
    if header[..SAVE_MAGIC.len()] != SAVE_MAGIC {
        return Err(PersistenceError::BadMagic);
    }
    let version = u16::from_le_bytes([header[4], header[5]]);
    if version != SAVE_VERSION {
        return Err(PersistenceError::UnsupportedVersion(version));
    }

    let save: SaveFile = bincode::deserialize(payload)?;
    save.validate()?;
    Ok(save)
}

/// Writes the layout to `path`, replacing any existing file atomically.
///
/// The bytes go to a sibling temporary file that is flushed to disk and then
/// renamed over the destination. On failure the temporary file is removed
/// and the previous save stays intact.
pub fn save_to_path(path: impl AsRef<Path>, save: &SaveFile) -> Result<(), PersistenceError> {
    let path = path.as_ref();
    let bytes = encode(save)?;
    let staging = staging_path(path);

    let result = write_synced(&staging, &bytes).and_then(|()| {
        fs::rename(&staging, path).map_err(|source| PersistenceError::Io {
            path: path.to_path_buf(),
            source,
        })
    });

    match result {
        Ok(()) => {
            info!(path = %path.display(), bytes = bytes.len(), "saved layout");
            Ok(())
        }
        Err(error) => {
            let _ = fs::remove_file(&staging);
            warn!(path = %path.display(), %error, "failed to save layout");
            Err(error)
        }
    }
}

/// Reads and decodes the layout stored at `path`.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<SaveFile, PersistenceError> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|source| PersistenceError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    match decode(&bytes) {
        Ok(save) => {
            info!(
                path = %path.display(),
                side = save.side,
                tiles = save.tiles.len(),
                "loaded layout"
            );
            Ok(save)
        }
        Err(error) => {
            warn!(path = %path.display(), %error, "rejected layout file");
            Err(error)
        }
    }
}

fn staging_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "layout".to_owned());
    path.with_file_name(format!(".{name}.tmp"))
}

fn write_synced(path: &Path, bytes: &[u8]) -> Result<(), PersistenceError> {
    let io_error = |source| PersistenceError::Io {
        path: path.to_path_buf(),
        source,
    };
    let mut file = File::create(path).map_err(io_error)?;
    file.write_all(bytes).map_err(io_error)?;
    file.sync_all().map_err(io_error)
}

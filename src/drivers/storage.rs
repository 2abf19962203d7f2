// SD card file operations on absolute paths ("/GPSLOG/24061007.CSV").
// Every call opens volume -> root -> each directory on the path, does
// its work and closes everything again; nothing stays open between
// calls, so the logger and the web server never see a stale handle.

use alloc::vec::Vec;
use core::fmt::Write;

use embedded_sdmmc::{Mode, ShortFileName, VolumeIdx};
use gpslog_core::StackFmt;
use gpslog_core::http::{path_components, split_path};
use gpslog_core::nvram::{NVRAM_SIZE, Nvram};
use log::{info, warn};

use crate::drivers::sdcard::SdStorage;

// firmware data lives under this directory on the SD root
pub const SETTINGS_DIR: &str = "_GPSLOG";

// 128-byte settings image, see gpslog_core::nvram
pub const NVRAM_FILE: &str = "NVRAM.BIN";

/// 8.3 name as text, at most "NNNNNNNN.EEE".
pub type Name83 = StackFmt<12>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Node {
    File { size: u32 },
    Dir,
}

// open volume -> root -> every directory in $path, execute body with
// the innermost handle
macro_rules! with_dir {
    ($sd:expr, $path:expr, |$dir:ident| $body:expr) => {{
        let volume = $sd
            .volume_mgr
            .open_volume(VolumeIdx(0))
            .map_err(|_| "open volume failed")?;
        #[allow(unused_mut)]
        let mut $dir = volume.open_root_dir().map_err(|_| "open root dir failed")?;
        for part in path_components($path) {
            $dir.change_dir(part).map_err(|_| "open dir failed")?;
        }
        $body
    }};
}

fn format_83_name(sfn: &ShortFileName) -> Name83 {
    let base = sfn.base_name();
    let ext = sfn.extension();

    let mut out = Name83::new();
    for &b in base.iter().take_while(|&&b| b != b' ') {
        let _ = out.write_char(b as char);
    }

    let ext_trimmed: &[u8] = &ext[..ext.iter().position(|&b| b == b' ').unwrap_or(ext.len())];
    if !ext_trimmed.is_empty() {
        let _ = out.write_char('.');
        for &b in ext_trimmed {
            let _ = out.write_char(b as char);
        }
    }

    out
}

// ── Queries ─────────────────────────────────────────────────────────

/// What is at `path`; `Ok(None)` when nothing is.  The root is a directory.
pub fn stat<SPI>(sd: &SdStorage<SPI>, path: &str) -> Result<Option<Node>, &'static str>
where
    SPI: embedded_hal::spi::SpiDevice,
{
    let (parent, name) = split_path(path);
    if name.is_empty() {
        return Ok(Some(Node::Dir));
    }
    with_dir!(sd, parent, |dir| {
        match dir.find_directory_entry(name) {
            Ok(entry) if entry.attributes.is_directory() => Ok(Some(Node::Dir)),
            Ok(entry) => Ok(Some(Node::File { size: entry.size })),
            Err(embedded_sdmmc::Error::NotFound | embedded_sdmmc::Error::FilenameError(_)) => {
                Ok(None)
            }
            Err(_) => Err("find entry failed"),
        }
    })
}

/// Call `f(name, is_dir, size)` for every entry of the directory at
/// `path`, skipping the volume label and the `.`/`..` links.
pub fn list_dir<SPI>(
    sd: &SdStorage<SPI>,
    path: &str,
    mut f: impl FnMut(&str, bool, u32),
) -> Result<(), &'static str>
where
    SPI: embedded_hal::spi::SpiDevice,
{
    with_dir!(sd, path, |dir| {
        dir.iterate_dir(|entry| {
            if entry.attributes.is_volume() || entry.name.base_name()[0] == b'.' {
                return;
            }
            let name = format_83_name(&entry.name);
            f(name.as_str(), entry.attributes.is_directory(), entry.size);
        })
        .map_err(|_| "iterate dir failed")?;
        Ok(())
    })
}

pub fn read_chunk<SPI>(
    sd: &SdStorage<SPI>,
    path: &str,
    offset: u32,
    buf: &mut [u8],
) -> Result<usize, &'static str>
where
    SPI: embedded_hal::spi::SpiDevice,
{
    let (parent, name) = split_path(path);
    with_dir!(sd, parent, |dir| {
        let file = dir
            .open_file_in_dir(name, Mode::ReadOnly)
            .map_err(|_| "open file failed")?;
        file.seek_from_start(offset).map_err(|_| "seek failed")?;
        let mut total = 0;
        while !file.is_eof() && total < buf.len() {
            let n = file.read(&mut buf[total..]).map_err(|_| "read failed")?;
            if n == 0 {
                break;
            }
            total += n;
        }
        Ok(total)
    })
}

// ── Writes ──────────────────────────────────────────────────────────

// create (or truncate) a file and write an initial chunk;
// use append_file for subsequent chunks
pub fn write_file<SPI>(sd: &SdStorage<SPI>, path: &str, data: &[u8]) -> Result<(), &'static str>
where
    SPI: embedded_hal::spi::SpiDevice,
{
    let (parent, name) = split_path(path);
    with_dir!(sd, parent, |dir| {
        let file = dir
            .open_file_in_dir(name, Mode::ReadWriteCreateOrTruncate)
            .map_err(|_| "open file for write failed")?;
        if !data.is_empty() {
            file.write(data).map_err(|_| "write failed")?;
        }
        file.flush().map_err(|_| "flush failed")?;
        Ok(())
    })
}

// append to a file, creating it when absent
pub fn append_file<SPI>(sd: &SdStorage<SPI>, path: &str, data: &[u8]) -> Result<(), &'static str>
where
    SPI: embedded_hal::spi::SpiDevice,
{
    let (parent, name) = split_path(path);
    with_dir!(sd, parent, |dir| {
        let file = dir
            .open_file_in_dir(name, Mode::ReadWriteCreateOrAppend)
            .map_err(|_| "open file for append failed")?;
        if !data.is_empty() {
            file.write(data).map_err(|_| "append write failed")?;
        }
        file.flush().map_err(|_| "append flush failed")?;
        Ok(())
    })
}

pub fn delete_file<SPI>(sd: &SdStorage<SPI>, path: &str) -> Result<(), &'static str>
where
    SPI: embedded_hal::spi::SpiDevice,
{
    let (parent, name) = split_path(path);
    with_dir!(sd, parent, |dir| {
        dir.delete_file_in_dir(name)
            .map_err(|_| "delete failed")?;
        Ok(())
    })
}

/// Delete every plain file directly inside `path`; returns how many went.
pub fn delete_all_files<SPI>(sd: &SdStorage<SPI>, path: &str) -> Result<usize, &'static str>
where
    SPI: embedded_hal::spi::SpiDevice,
{
    // the directory can't be modified while it is being iterated
    let mut names: Vec<Name83> = Vec::new();
    list_dir(sd, path, |name, is_dir, _| {
        if !is_dir {
            let mut n = Name83::new();
            let _ = n.write_str(name);
            names.push(n);
        }
    })?;

    with_dir!(sd, path, |dir| {
        let mut deleted = 0;
        for name in &names {
            match dir.delete_file_in_dir(name.as_str()) {
                Ok(()) => deleted += 1,
                Err(e) => warn!("sd: delete {} failed: {:?}", name.as_str(), e),
            }
        }
        Ok(deleted)
    })
}

pub fn make_dir<SPI>(sd: &SdStorage<SPI>, path: &str) -> Result<(), &'static str>
where
    SPI: embedded_hal::spi::SpiDevice,
{
    let (parent, name) = split_path(path);
    with_dir!(sd, parent, |dir| {
        dir.make_dir_in_dir(name).map_err(|_| "make dir failed")?;
        Ok(())
    })
}

// create dir in root if it doesn't already exist
pub fn ensure_dir<SPI>(sd: &SdStorage<SPI>, name: &str) -> Result<(), &'static str>
where
    SPI: embedded_hal::spi::SpiDevice,
{
    with_dir!(sd, "/", |root| {
        // already exists; done
        if root.open_dir(name).is_ok() {
            return Ok(());
        }
        root.make_dir_in_dir(name).map_err(|_| "make dir failed")?;
        Ok(())
    })
}

// ── Settings image ──────────────────────────────────────────────────

/// Read `_GPSLOG/NVRAM.BIN`; a missing or unreadable file is a blank image.
pub fn load_nvram<SPI>(sd: &SdStorage<SPI>) -> Nvram
where
    SPI: embedded_hal::spi::SpiDevice,
{
    let mut buf = [0u8; NVRAM_SIZE];
    let path = nvram_path();
    match read_chunk(sd, path.as_str(), 0, &mut buf) {
        Ok(n) => {
            info!("nvram: loaded {} bytes from {}", n, path.as_str());
            Nvram::from_bytes(&buf[..n])
        }
        Err(e) => {
            info!("nvram: {} ({}), using blank settings", e, path.as_str());
            Nvram::blank()
        }
    }
}

pub fn save_nvram<SPI>(sd: &SdStorage<SPI>, nvram: &Nvram) -> Result<(), &'static str>
where
    SPI: embedded_hal::spi::SpiDevice,
{
    ensure_dir(sd, SETTINGS_DIR)?;
    let path = nvram_path();
    write_file(sd, path.as_str(), nvram.as_bytes())?;
    info!("nvram: saved to {}", path.as_str());
    Ok(())
}

fn nvram_path() -> StackFmt<24> {
    let mut path = StackFmt::new();
    let _ = write!(path, "/{}/{}", SETTINGS_DIR, NVRAM_FILE);
    path
}

// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Chat Branches and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

/// Maps an id to a file name segment that is valid on every supported platform.
///
/// Ids that are already safe pass through unchanged; anything else becomes `~` followed by the
/// lowercase hex of its UTF-8 bytes. `~` itself forces encoding so decoding is unambiguous.
fn encode_persisted_id_segment(segment: &str) -> String {
    if is_portable_file_stem(segment) {
        return segment.to_owned();
    }

    use std::fmt::Write as _;

    let mut out = String::with_capacity(1 + segment.len() * 2);
    out.push('~');
    for byte in segment.bytes() {
        let _ = write!(out, "{byte:02x}");
    }
    out
}

/// Inverse of [`encode_persisted_id_segment`]. `None` for malformed hex or non-UTF-8 bytes.
fn decode_persisted_id_segment(file_stem: &str) -> Option<String> {
    let Some(hex) = file_stem.strip_prefix('~') else {
        return Some(file_stem.to_owned());
    };
    if hex.is_empty() || hex.len() % 2 != 0 {
        return None;
    }

    let bytes = (0..hex.len())
        .step_by(2)
        .map(|start| u8::from_str_radix(hex.get(start..start + 2)?, 16).ok())
        .collect::<Option<Vec<u8>>>()?;
    String::from_utf8(bytes).ok()
}

fn is_portable_file_stem(segment: &str) -> bool {
    if segment.is_empty() || segment.starts_with(['~', '.']) || segment.ends_with([' ', '.']) {
        return false;
    }
    let forbidden = |ch: char| {
        ch.is_control() || matches!(ch, '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*')
    };
    if segment.chars().any(forbidden) {
        return false;
    }

    let base = segment.split('.').next().unwrap_or(segment);
    !is_reserved_device_name(base)
}

fn is_reserved_device_name(base: &str) -> bool {
    let upper = base.trim_end().to_ascii_uppercase();
    if matches!(upper.as_str(), "CON" | "PRN" | "AUX" | "NUL") {
        return true;
    }
    ["COM", "LPT"].iter().any(|prefix| {
        upper
            .strip_prefix(prefix)
            .is_some_and(|digit| matches!(digit.as_bytes(), [b'1'..=b'9']))
    })
}

fn rename_overwrite(from: &Path, to: &Path) -> io::Result<()> {
    #[cfg(windows)]
    {
        match fs::rename(from, to) {
            Ok(()) => Ok(()),
            Err(err)
                if matches!(
                    err.kind(),
                    io::ErrorKind::AlreadyExists | io::ErrorKind::PermissionDenied
                ) =>
            {
                let _ = fs::remove_file(to);
                fs::rename(from, to)
            }
            Err(err) => Err(err),
        }
    }

    #[cfg(not(windows))]
    {
        fs::rename(from, to)
    }
}

/// Fails with `SymlinkRefused` when `path` is a symlink; missing paths are fine.
fn refuse_symlink(path: &Path) -> Result<(), StoreError> {
    match fs::symlink_metadata(path) {
        Ok(md) if md.file_type().is_symlink() => Err(StoreError::SymlinkRefused {
            path: path.to_path_buf(),
        }),
        Ok(_) => Ok(()),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(source) => Err(StoreError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Creates `dir` (a direct child of `root`) unless it exists, refusing symlinked directories.
fn ensure_dir_in_folder(root: &Path, dir: &Path) -> Result<(), StoreError> {
    fs::create_dir_all(root).map_err(|source| StoreError::Io {
        path: root.to_path_buf(),
        source,
    })?;

    refuse_symlink(dir)?;
    match fs::create_dir(dir) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == io::ErrorKind::AlreadyExists && dir.is_dir() => Ok(()),
        Err(source) => Err(StoreError::Io {
            path: dir.to_path_buf(),
            source,
        }),
    }
}

/// Writes `contents` to a temp file next to `path` and renames it into place.
fn write_atomic_in_folder(
    root: &Path,
    path: &Path,
    contents: &[u8],
    durability: WriteDurability,
) -> Result<(), StoreError> {
    let Some(parent) = path.parent() else {
        return Err(StoreError::Io {
            path: path.to_path_buf(),
            source: io::Error::other("path has no parent"),
        });
    };
    let Some(file_name) = path.file_name() else {
        return Err(StoreError::Io {
            path: path.to_path_buf(),
            source: io::Error::other("path has no file name"),
        });
    };

    ensure_dir_in_folder(root, parent)?;
    refuse_symlink(path)?;

    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let tmp_path = parent.join(format!(
        "{TEMP_FILE_PREFIX}{}.{}.{nanos}",
        file_name.to_string_lossy(),
        std::process::id()
    ));

    let mut file = fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&tmp_path)
        .map_err(|source| StoreError::Io {
            path: tmp_path.clone(),
            source,
        })?;

    let written = file.write_all(contents).and_then(|()| {
        if durability == WriteDurability::Durable {
            file.sync_all()
        } else {
            Ok(())
        }
    });
    drop(file);
    if let Err(source) = written {
        let _ = fs::remove_file(&tmp_path);
        return Err(StoreError::Io {
            path: tmp_path,
            source,
        });
    }

    if let Err(source) = rename_overwrite(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(StoreError::Io {
            path: path.to_path_buf(),
            source,
        });
    }

    #[cfg(unix)]
    if durability == WriteDurability::Durable {
        let dir = fs::File::open(parent).map_err(|source| StoreError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
        dir.sync_all().map_err(|source| StoreError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    Ok(())
}

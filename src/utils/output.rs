use anyhow::{bail, Context, Result};
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Write any serializable value as pretty-printed JSON.
pub fn write_json<T: Serialize + ?Sized, P: AsRef<Path>>(value: &T, path: P) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;

    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value)
        .with_context(|| format!("writing {}", path.display()))?;
    writer.flush()?;
    Ok(())
}

/// Check that `path` names an existing regular file.
pub fn validate_input_file<P: AsRef<Path>>(path: P) -> Result<()> {
    let path = path.as_ref();
    if path.as_os_str().is_empty() {
        bail!("missing file name");
    }

    let metadata = std::fs::metadata(path)
        .with_context(|| format!("{} does not exist", path.display()))?;
    if metadata.is_dir() {
        bail!("{} is a directory", path.display());
    }
    Ok(())
}

/// Check that `path` can be written.
///
/// An existing file is only accepted with `overwrite`. The file is created
/// (empty) so permission problems surface before any work is done.
pub fn validate_output_file<P: AsRef<Path>>(path: P, overwrite: bool) -> Result<()> {
    let path = path.as_ref();
    if path.as_os_str().is_empty() {
        bail!("missing file name");
    }

    match std::fs::metadata(path) {
        Ok(metadata) if metadata.is_dir() => bail!("{} is a directory", path.display()),
        Ok(_) if !overwrite => bail!("{} already exists", path.display()),
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(e).with_context(|| format!("inspecting {}", path.display())),
    }

    File::create(path).with_context(|| format!("creating {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir()
            .join(format!("anomaly_detector_{}_{}", name, std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_write_json_round_trips() {
        let dir = scratch_dir("write_json");
        let path = dir.join("out.json");

        write_json(&vec![1, 2, 3], &path).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        let back: Vec<i32> = serde_json::from_str(&written).unwrap();
        assert_eq!(back, vec![1, 2, 3]);

        std::fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn test_output_file_respects_overwrite_flag() {
        let dir = scratch_dir("overwrite");
        let path = dir.join("report.json");

        validate_output_file(&path, false).unwrap();
        assert!(path.exists());
        assert!(validate_output_file(&path, false).is_err());
        validate_output_file(&path, true).unwrap();
        assert!(validate_output_file(&dir, true).is_err());

        std::fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn test_input_file_checks() {
        let dir = scratch_dir("input");
        let path = dir.join("config.toml");

        assert!(validate_input_file(&path).is_err());
        std::fs::write(&path, "datasets = []").unwrap();
        validate_input_file(&path).unwrap();
        assert!(validate_input_file(&dir).is_err());
        assert!(validate_input_file("").is_err());

        std::fs::remove_dir_all(dir).unwrap();
    }
}

use std::{
    collections::HashMap,
    fs::File,
    io::Read,
    path::{Path, PathBuf},
};

use anyhow::Context;

#[derive(Clone, Debug)]
pub struct Asset {
    pub name: String,
    pub bytes: Vec<u8>,
}

/// Reads asset files by name from a root folder and keeps their bytes around,
/// so asking for the same asset twice only touches the filesystem once.
pub struct Loader {
    root: PathBuf,
    assets: HashMap<String, Asset>,
}

impl Loader {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            assets: HashMap::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_of(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    pub fn get(&self, name: &str) -> Option<&Asset> {
        self.assets.get(name)
    }

    pub fn load(&mut self, name: &str) -> anyhow::Result<&Asset> {
        if !self.assets.contains_key(name) {
            let path = self.path_of(name);
            let mut file =
                File::open(&path).with_context(|| format!("Couldn't open asset {:?}", path))?;
            let mut bytes = Vec::new();
            file.read_to_end(&mut bytes)
                .with_context(|| format!("Couldn't read asset {:?}", path))?;
            log::debug!("loaded {} bytes from {:?}", bytes.len(), path);
            self.assets.insert(
                name.to_string(),
                Asset {
                    name: name.to_string(),
                    bytes,
                },
            );
        }

        self.assets
            .get(name)
            .ok_or_else(|| anyhow::anyhow!("Asset {} missing from cache.", name))
    }

    pub fn evict(&mut self, name: &str) -> Option<Asset> {
        self.assets.remove(name)
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    fn scratch_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "bitglyph_asset_{}_{}",
            tag,
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn loads_bytes_relative_to_root() {
        let dir = scratch_dir("relative");
        fs::write(dir.join("A.png"), [1u8, 2, 3]).unwrap();

        let mut loader = Loader::new(&dir);
        let asset = loader.load("A.png").unwrap();
        assert_eq!(asset.name, "A.png");
        assert_eq!(asset.bytes, vec![1, 2, 3]);

        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn serves_cached_bytes_after_file_is_gone() {
        let dir = scratch_dir("cached");
        fs::write(dir.join("0.png"), [9u8]).unwrap();

        let mut loader = Loader::new(&dir);
        loader.load("0.png").unwrap();
        fs::remove_file(dir.join("0.png")).unwrap();

        assert_eq!(loader.load("0.png").unwrap().bytes, vec![9]);
        assert!(loader.evict("0.png").is_some());
        assert!(loader.load("0.png").is_err());

        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn missing_asset_names_the_path() {
        let dir = scratch_dir("missing");
        let mut loader = Loader::new(&dir);

        let err = loader.load("QMark.png").unwrap_err();
        assert!(format!("{:#}", err).contains("QMark.png"));
        assert!(loader.get("QMark.png").is_none());

        fs::remove_dir_all(dir).unwrap();
    }
}

use std::path::PathBuf;

use anyhow::{Context, Result};

/// Load the nearest .env file, searching from the current directory up to the
/// filesystem root. Returns the loaded path, or `None` if there is no .env.
pub fn load_dotenv_from_ancestors() -> Result<Option<PathBuf>> {
    let cwd = std::env::current_dir().context("Failed to get current directory")?;

    let mut current = cwd.as_path();
    loop {
        let env_path = current.join(".env");
        if env_path.exists() {
            dotenvy::from_path(&env_path)
                .with_context(|| format!("Failed to load .env from {}", env_path.display()))?;
            return Ok(Some(env_path));
        }

        match current.parent() {
            Some(parent) => current = parent,
            None => return Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    #[serial]
    fn test_load_dotenv_from_current_directory() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join(".env"), "REST2ES_TEST_CURRENT=hello").unwrap();

        let original_dir = std::env::current_dir().unwrap();
        std::env::set_current_dir(temp_dir.path()).unwrap();
        std::env::remove_var("REST2ES_TEST_CURRENT");

        let loaded = load_dotenv_from_ancestors().unwrap();
        assert!(loaded.is_some(), "Should find .env in current directory");
        assert_eq!(std::env::var("REST2ES_TEST_CURRENT").unwrap(), "hello");

        std::env::set_current_dir(original_dir).unwrap();
        std::env::remove_var("REST2ES_TEST_CURRENT");
    }

    #[test]
    #[serial]
    fn test_load_dotenv_prefers_closest_env_file() {
        let parent_dir = TempDir::new().unwrap();
        let child_dir = parent_dir.path().join("subdir");
        fs::create_dir(&child_dir).unwrap();

        fs::write(parent_dir.path().join(".env"), "REST2ES_TEST_CLOSEST=parent").unwrap();
        fs::write(child_dir.join(".env"), "REST2ES_TEST_CLOSEST=child").unwrap();

        let original_dir = std::env::current_dir().unwrap();
        std::env::set_current_dir(&child_dir).unwrap();
        std::env::remove_var("REST2ES_TEST_CLOSEST");

        load_dotenv_from_ancestors().unwrap();
        assert_eq!(std::env::var("REST2ES_TEST_CLOSEST").unwrap(), "child");

        std::env::set_current_dir(original_dir).unwrap();
        std::env::remove_var("REST2ES_TEST_CLOSEST");
    }

    #[test]
    #[serial]
    fn test_load_dotenv_from_parent_directory() {
        let parent_dir = TempDir::new().unwrap();
        let child_dir = parent_dir.path().join("a").join("b");
        fs::create_dir_all(&child_dir).unwrap();
        fs::write(parent_dir.path().join(".env"), "REST2ES_TEST_PARENT=world").unwrap();

        let original_dir = std::env::current_dir().unwrap();
        std::env::set_current_dir(&child_dir).unwrap();
        std::env::remove_var("REST2ES_TEST_PARENT");

        let loaded = load_dotenv_from_ancestors().unwrap().unwrap();
        assert!(loaded.ends_with(".env"));
        assert_eq!(std::env::var("REST2ES_TEST_PARENT").unwrap(), "world");

        std::env::set_current_dir(original_dir).unwrap();
        std::env::remove_var("REST2ES_TEST_PARENT");
    }
}

use directories::ProjectDirs;

const PROJECT_ROOT: &str = env!("CARGO_MANIFEST_DIR");

pub fn asset_dir() -> std::path::PathBuf {
    if let Ok(custom) = std::env::var("ANTHONY_RUN_DATA_DIR") {
        let custom_path = std::path::PathBuf::from(custom);
        if !custom_path.exists() {
            std::fs::create_dir_all(&custom_path)
                .expect("Failed to create custom ANTHONY_RUN_DATA_DIR directory");
        }
        return custom_path;
    }

    let path = if cfg!(debug_assertions) {
        std::path::PathBuf::from(PROJECT_ROOT).join("../../dev_assets")
    } else {
        ProjectDirs::from("run", "anthony", "anthony-run")
            .expect("OS didn't give us a home directory")
            .data_dir()
            .to_path_buf()
    };

    if !path.exists() {
        std::fs::create_dir_all(&path).expect("Failed to create asset directory");
    }

    path
}

pub fn db_path() -> std::path::PathBuf {
    asset_dir().join("db.sqlite")
}

//! Credential file tests.

use std::fs;

use std::collections::BTreeMap;

use ghostwriter::credentials::{
    load_credentials, Credentials, CHAT_API_KEY, YANDEX_FOLDER_ID, YANDEX_SEARCH_API_KEY,
};

#[cfg(unix)]
fn set_mode(path: &std::path::Path, mode: u32) {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode)).expect("chmod");
}

#[cfg(unix)]
#[test]
fn private_env_file_loads() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join(".env");
    fs::write(&path, "YANDEX_FOLDER_ID=b1gfolder\nCHAT_API_KEY=\"sk-quoted\"\nEMPTY=\n")
        .expect("env file");
    set_mode(&path, 0o600);

    let credentials = match load_credentials(&path) {
        Ok(credentials) => credentials,
        Err(err) => panic!("credentials should load: {err}"),
    };
    assert_eq!(credentials.get(YANDEX_FOLDER_ID), Some("b1gfolder"));
    assert_eq!(credentials.get(CHAT_API_KEY), Some("sk-quoted"));
    assert_eq!(credentials.get("EMPTY"), None);
    assert!(credentials.require("MISSING").is_err());

    let debug = format!("{credentials:?}");
    assert!(!debug.contains("sk-quoted"));
}

#[cfg(unix)]
#[test]
fn world_readable_env_file_is_rejected() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join(".env");
    fs::write(&path, "CHAT_API_KEY=sk-x\n").expect("env file");
    set_mode(&path, 0o644);

    let err = match load_credentials(&path) {
        Ok(_) => panic!("broad permissions should be rejected"),
        Err(err) => err,
    };
    assert!(err.to_string().contains("0600"));
}

#[test]
fn missing_env_file_is_an_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    assert!(load_credentials(&dir.path().join(".env")).is_err());
}

#[test]
fn search_keys_need_folder_and_key() {
    let mut vars = BTreeMap::new();
    vars.insert(YANDEX_FOLDER_ID.to_owned(), "b1gfolder".to_owned());
    let partial = Credentials::from_map(vars.clone());
    assert!(partial.search_keys().is_none());

    vars.insert(YANDEX_SEARCH_API_KEY.to_owned(), "AQVNsearch".to_owned());
    let keys = match Credentials::from_map(vars).search_keys() {
        Some(keys) => keys,
        None => panic!("search keys should be present"),
    };
    assert_eq!(keys.folder_id, "b1gfolder");
    assert_eq!(keys.api_key, "AQVNsearch");
    assert!(!format!("{keys:?}").contains("AQVNsearch"));
}

#[test]
fn environment_fills_only_missing_keys() {
    let mut vars = BTreeMap::new();
    vars.insert(CHAT_API_KEY.to_owned(), "sk-file".to_owned());
    vars.insert(YANDEX_FOLDER_ID.to_owned(), "  ".to_owned());

    let credentials = Credentials::from_map(vars).fill_missing_from(|key| match key {
        "CHAT_API_KEY" => Some("sk-env".to_owned()),
        "YANDEX_FOLDER_ID" => Some("b1genv".to_owned()),
        "UNRELATED" => Some("ignored".to_owned()),
        _ => None,
    });
    assert_eq!(credentials.get(CHAT_API_KEY), Some("sk-file"));
    assert_eq!(credentials.get(YANDEX_FOLDER_ID), Some("b1genv"));
    assert_eq!(credentials.get(YANDEX_SEARCH_API_KEY), None);
    assert_eq!(credentials.get("UNRELATED"), None);
}

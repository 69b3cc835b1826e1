// Shared test helpers for CSV fixtures, zip archives and mock-server options.
//
// This module provides common utilities used across multiple test files to reduce duplication.

use std::io::{Cursor, Write};
use std::path::Path;

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

use geoip_csv::GeoIpOptions;

pub const LICENSE_KEY: &str = "test-key";
pub const EDITION: &str = "GeoLite2-City-CSV";
/// Archive path served by the mock server for the options built below.
pub const ARCHIVE_PATH: &str = "/download/GeoLite2-City-CSV/test-key.zip";
pub const SIDECAR_PATH: &str = "/download/GeoLite2-City-CSV/test-key.zip.sha256";

pub const CITY_BLOCKS_IPV4: &str = "network,geoname_id,registered_country_geoname_id,represented_country_geoname_id,is_anonymous_proxy,is_satellite_provider,postal_code,latitude,longitude,accuracy_radius,is_anycast\n\
    1.0.0.0/24,2077456,2077456,,0,0,,-33.4940,143.2104,1000,\n\
    8.8.8.0/24,6252001,6252001,,0,0,,37.7510,-97.8220,1000,\n\
    203.0.113.0/24,2950159,2921044,,0,0,10115,52.5200,13.4050,20,0\n";

pub const CITY_BLOCKS_IPV6: &str = "network,geoname_id,latitude,longitude\n\
    2001:db8::/32,2950159,52.5200,13.4050\n";

pub const CITY_LOCATIONS: &str = "geoname_id,locale_code,continent_code,continent_name,country_iso_code,country_name,subdivision_1_iso_code,subdivision_1_name,subdivision_2_iso_code,subdivision_2_name,city_name,metro_code,time_zone,is_in_european_union\n\
    2077456,en,OC,Oceania,AU,Australia,,,,,,,Australia/Sydney,0\n\
    6252001,en,NA,\"North America\",US,\"United States\",,,,,,,America/Chicago,0\n\
    2950159,en,EU,Europe,DE,Germany,BE,\"Land Berlin\",,,Berlin,,Europe/Berlin,1\n";

/// Writes one fixture file into `dir`.
pub fn write_csv(dir: &Path, name: &str, contents: &str) {
    std::fs::write(dir.join(name), contents).expect("Failed to write fixture");
}

/// Writes the City edition fixture set into `dir`.
#[allow(dead_code)] // Used by other test files
pub fn write_city_fixture(dir: &Path) {
    write_csv(dir, "GeoLite2-City-Blocks-IPv4.csv", CITY_BLOCKS_IPV4);
    write_csv(dir, "GeoLite2-City-Blocks-IPv6.csv", CITY_BLOCKS_IPV6);
    write_csv(dir, "GeoLite2-City-Locations-en.csv", CITY_LOCATIONS);
}

/// Builds an in-memory zip laid out like a MaxMind CSV download.
#[allow(dead_code)]
pub fn build_archive(entries: &[(&str, &str)]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);
    for (name, contents) in entries {
        writer
            .start_file(format!("GeoLite2-City-CSV_20240101/{}", name), options)
            .expect("Failed to start zip entry");
        writer
            .write_all(contents.as_bytes())
            .expect("Failed to write zip entry");
    }
    writer
        .finish()
        .expect("Failed to finish zip archive")
        .into_inner()
}

/// The City fixture set as a downloadable archive.
#[allow(dead_code)]
pub fn city_archive() -> Vec<u8> {
    build_archive(&[
        ("GeoLite2-City-Blocks-IPv4.csv", CITY_BLOCKS_IPV4),
        ("GeoLite2-City-Blocks-IPv6.csv", CITY_BLOCKS_IPV6),
        ("GeoLite2-City-Locations-en.csv", CITY_LOCATIONS),
        ("COPYRIGHT.txt", "test data"),
    ])
}

#[allow(dead_code)]
pub fn sha256_hex(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

/// `Last-Modified` header value for `when`.
#[allow(dead_code)]
pub fn http_date(when: DateTime<Utc>) -> String {
    when.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// Options pointing the download URL at a mock server.
#[allow(dead_code)]
pub fn update_options(server_uri: &str, data_dir: &Path) -> GeoIpOptions {
    GeoIpOptions {
        data_directory: data_dir.to_path_buf(),
        license_key: LICENSE_KEY.to_string(),
        edition: EDITION.to_string(),
        download_url: format!(
            "{}/download/$(MaxmindEdition)/$(MaxmindLicenseKey).zip",
            server_uri
        ),
        download_retries: 0,
        request_timeout_secs: 10,
        ..Default::default()
    }
}

/// Sets a file's modification time.
#[allow(dead_code)]
pub fn set_mtime(path: &Path, when: DateTime<Utc>) {
    let file = std::fs::File::options()
        .write(true)
        .open(path)
        .expect("Failed to open file");
    file.set_modified(when.into())
        .expect("Failed to set modification time");
}

//! UnityFS Bundle Round Trip Tests
//!
//! Encodes bundles with every supported compression, decodes them again and
//! checks entries, recorded settings and the body checksum. Also corrupts
//! encoded bundles to make sure structural errors are fatal.

use anyhow::Result;
use unity_graft::bundle::{BundleEntry, BundleFile, BundleWriteOptions};
use unity_graft::compression::CompressionType;
use unity_graft::crc::crc32;
use unity_graft::{BinaryError, Stream};

const BLOCK_SIZE: usize = 64 * 1024;

/// Compressible payload: repeated text with a running counter
fn text_payload(len: usize) -> Vec<u8> {
    let mut data = Vec::with_capacity(len);
    let mut line = 0u32;
    while data.len() < len {
        data.extend_from_slice(format!("m_Name: object_{:06}\n", line).as_bytes());
        line += 1;
    }
    data.truncate(len);
    data
}

fn sample_bundle(data_compression: CompressionType) -> BundleFile {
    let mut bundle = BundleFile::new("2019.4.40f1");
    bundle.data_compression = data_compression;
    bundle.block_size = BLOCK_SIZE;
    bundle.add_entry(BundleEntry::new("CAB-4d6f", Stream::from_vec(text_payload(300_000))));
    bundle.add_entry(BundleEntry::new("CAB-4d6f.resS", Stream::from_vec(text_payload(1_234))));
    bundle
}

fn entry_bytes(bundle: &BundleFile) -> Vec<(String, Vec<u8>)> {
    bundle
        .entries
        .iter()
        .map(|entry| (entry.name.clone(), entry.data.to_vec()))
        .collect()
}

#[test]
fn test_round_trip_every_compression() -> Result<()> {
    for kind in [
        CompressionType::None,
        CompressionType::Lzma,
        CompressionType::Lz4,
        CompressionType::Lz4Hc,
    ] {
        let bundle = sample_bundle(kind);
        let encoded = bundle.serialize()?;
        let decoded = BundleFile::from_stream(&encoded)?;

        println!("{}: {} bytes encoded", kind.name(), encoded.len());
        assert_eq!(entry_bytes(&decoded), entry_bytes(&bundle), "{}", kind.name());
        assert_eq!(decoded.data_compression, kind);
        assert_eq!(decoded.unity_version, "5.x.x");
        assert_eq!(decoded.unity_revision, "2019.4.40f1");
        assert!(decoded.asset_bundle_crc.is_some());
    }
    Ok(())
}

#[test]
fn test_lz4_block_size_is_recovered() -> Result<()> {
    let bundle = sample_bundle(CompressionType::Lz4Hc);
    let decoded = BundleFile::from_stream(&bundle.serialize()?)?;
    assert_eq!(decoded.block_size, BLOCK_SIZE);

    let stored = sample_bundle(CompressionType::None);
    let decoded = BundleFile::from_stream(&stored.serialize()?)?;
    // One block holding the whole body
    assert!(decoded.block_size >= 300_000);
    assert!(decoded.block_size.is_power_of_two());
    Ok(())
}

#[test]
fn test_reencoding_is_stable() -> Result<()> {
    let bundle = sample_bundle(CompressionType::Lz4);
    let first = bundle.serialize()?;
    let decoded = BundleFile::from_stream(&first)?;
    let second = decoded.serialize()?;
    let again = BundleFile::from_stream(&second)?;

    assert_eq!(entry_bytes(&again), entry_bytes(&bundle));
    assert_eq!(again.asset_bundle_crc, decoded.asset_bundle_crc);
    Ok(())
}

#[test]
fn test_worker_count_does_not_change_output() -> Result<()> {
    let bundle = sample_bundle(CompressionType::Lz4Hc);
    let single = bundle.serialize_with_options(&BundleWriteOptions {
        worker_threads: Some(1),
    })?;
    let several = bundle.serialize_with_options(&BundleWriteOptions {
        worker_threads: Some(4),
    })?;
    assert_eq!(single.data(), several.data());
    Ok(())
}

#[test]
fn test_edited_bundle_keeps_checksum() -> Result<()> {
    let original = BundleFile::from_stream(&sample_bundle(CompressionType::Lz4).serialize()?)?;
    let recorded = original.asset_bundle_crc.expect("decoded bundles record a CRC");

    let mut edited = original.clone();
    edited
        .entry_mut("CAB-4d6f")
        .expect("entry exists")
        .replace_data(Stream::from_vec(text_payload(12_345)));

    let reencoded = BundleFile::from_stream(&edited.serialize()?)?;
    assert_eq!(reencoded.asset_bundle_crc, Some(recorded));
    assert_eq!(reencoded.entry("CAB-4d6f").map(|e| e.data.len()), Some(12_345));
    assert_eq!(
        reencoded.entry("CAB-4d6f.resS").map(|e| e.data.to_vec()),
        original.entry("CAB-4d6f.resS").map(|e| e.data.to_vec())
    );
    Ok(())
}

#[test]
fn test_without_recorded_crc_body_is_not_adjusted() -> Result<()> {
    let mut bundle = BundleFile::new("");
    bundle.add_entry(BundleEntry::new("CAB-1", Stream::from_vec(vec![7; 32])));
    let decoded = BundleFile::from_stream(&bundle.serialize()?)?;
    assert_eq!(decoded.asset_bundle_crc, Some(crc32(&[7; 32])));
    Ok(())
}

/// Offset of the directory hash when the directory is stored uncompressed
fn directory_hash_offset(bundle: &BundleFile) -> usize {
    let strings = bundle.unity_version.len() + 1 + bundle.unity_revision.len() + 1;
    "UnityFS\0".len() + 4 + strings + 8 + 4 + 4 + 4
}

#[test]
fn test_nonzero_directory_hash_is_fatal() -> Result<()> {
    let mut bundle = BundleFile::new("");
    bundle.directory_compression = CompressionType::None;
    bundle.add_entry(BundleEntry::new("CAB-1", Stream::from_vec(vec![1; 16])));

    let mut bytes = bundle.serialize()?.to_vec();
    let offset = directory_hash_offset(&bundle);
    assert_eq!(&bytes[offset..offset + 16], &[0; 16]);
    bytes[offset + 15] = 1;

    let result = BundleFile::from_bytes(bytes);
    assert!(matches!(result, Err(BinaryError::InvalidFormat(_))));
    Ok(())
}

#[test]
fn test_size_mismatch_is_fatal() -> Result<()> {
    let mut bytes = sample_bundle(CompressionType::None).serialize()?.to_vec();
    bytes.push(0);
    assert!(matches!(
        BundleFile::from_bytes(bytes),
        Err(BinaryError::InvalidFormat(_))
    ));
    Ok(())
}

#[test]
fn test_unknown_archive_option_is_fatal() -> Result<()> {
    let bundle = BundleFile::new("");
    let mut bytes = bundle.serialize()?.to_vec();
    // Last byte of the big-endian flags field
    let flags_end = directory_hash_offset(&bundle) - 1;
    bytes[flags_end] |= 0x80;

    let err = BundleFile::from_bytes(bytes).unwrap_err();
    assert!(!err.is_recoverable());
    Ok(())
}

#[test]
fn test_bad_signature_and_version() -> Result<()> {
    let bytes = sample_bundle(CompressionType::None).serialize()?.to_vec();

    let mut bad_signature = bytes.clone();
    bad_signature[0] = b'X';
    assert!(matches!(
        BundleFile::from_bytes(bad_signature),
        Err(BinaryError::InvalidSignature { .. })
    ));

    let mut bad_version = bytes;
    bad_version[11] = 7;
    assert!(matches!(
        BundleFile::from_bytes(bad_version),
        Err(BinaryError::UnsupportedVersion(_))
    ));
    Ok(())
}

#[test]
fn test_truncated_body_is_fatal() -> Result<()> {
    let mut bytes = sample_bundle(CompressionType::Lz4).serialize()?.to_vec();
    bytes.truncate(bytes.len() - 10);
    // Fix the declared size so the body check is what fails
    let size_offset = "UnityFS\0".len() + 4 + "5.x.x\0".len() + "2019.4.40f1\0".len();
    let size = bytes.len() as u64;
    bytes[size_offset..size_offset + 8].copy_from_slice(&size.to_be_bytes());

    assert!(matches!(
        BundleFile::from_bytes(bytes),
        Err(BinaryError::InvalidFormat(_))
    ));
    Ok(())
}

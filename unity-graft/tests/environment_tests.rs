//! Linked Environment Tests
//!
//! Builds small bundles in memory, loads them into a LinkedEnvironment and
//! checks pointer resolution within an asset, across assets and into
//! streamed resource files, along with the soft failures left behind.

use anyhow::Result;
use unity_graft::asset::{FileIdentifier, SerializedFile, SerializedType};
use unity_graft::bundle::{BundleEntry, BundleFile};
use unity_graft::classes::{
    AssetBundle, AssetInfo, ComponentPair, GameObject, MeshFilter, PreloadData, TextAsset, Texture2D,
    Transform,
};
use unity_graft::compression::CompressionType;
use unity_graft::serializer::{Transfer, encode_object};
use unity_graft::{
    BinaryError, LinkedEnvironment, ObjectPointer, SoftFailure, Stream, StreamingInfo, UnityClass,
    object_cast,
};
use unity_graft_core::class_id;

/// Builder for version 22 serialized files
struct AssetBuilder {
    file: SerializedFile,
}

impl AssetBuilder {
    fn new() -> Self {
        Self {
            file: SerializedFile::new(22).expect("version 22 is supported"),
        }
    }

    fn external(mut self, path: &str) -> Self {
        self.file
            .add_external(FileIdentifier::new([0; 16], 0, path.to_string()));
        self
    }

    fn object<T: Transfer + UnityClass>(mut self, path_id: i64, mut object: T) -> Self {
        let data = encode_object(&mut object, 0).expect("object encodes");
        self.raw(path_id, T::CLASS_ID, data)
    }

    fn raw(mut self, path_id: i64, class_id: i32, data: Stream) -> Self {
        let type_id = match self.file.find_type(class_id) {
            Some(type_id) => type_id,
            None => self.file.add_type(SerializedType::new(class_id)),
        };
        self.file.add_object(path_id, type_id, data);
        self
    }

    fn build(self) -> Stream {
        self.file.serialize().expect("file encodes")
    }
}

/// Encode and decode a bundle so the environment sees parsed entries
fn bundle(entries: Vec<(&str, Stream)>) -> Result<BundleFile> {
    let mut bundle = BundleFile::new("2019.4.40f1");
    bundle.data_compression = CompressionType::Lz4Hc;
    for (name, data) in entries {
        bundle.add_entry(BundleEntry::new(name, data));
    }
    Ok(BundleFile::from_stream(&bundle.serialize()?)?)
}

fn pointer<T>(file_id: i32, path_id: i64) -> ObjectPointer<T> {
    ObjectPointer::new(file_id, path_id)
}

fn resource_bytes() -> Vec<u8> {
    (0u8..32).collect()
}

fn main_asset() -> Stream {
    AssetBuilder::new()
        .external("archive:/CAB-shared/CAB-shared")
        .object(
            1,
            AssetBundle {
                name: "level".to_string(),
                preload_table: vec![pointer(0, 5), pointer(1, 2)],
                container: vec![(
                    "assets/tex.png".to_string(),
                    AssetInfo {
                        preload_index: 0,
                        preload_size: 2,
                        asset: pointer(0, 5),
                    },
                )],
                ..Default::default()
            },
        )
        .object(
            2,
            GameObject {
                components: vec![
                    ComponentPair {
                        component: pointer(0, 3),
                    },
                    ComponentPair {
                        component: pointer(0, 4),
                    },
                ],
                name: "Player".to_string(),
                ..Default::default()
            },
        )
        .object(
            3,
            Transform {
                game_object: pointer(0, 2),
                ..Default::default()
            },
        )
        .object(
            4,
            MeshFilter {
                game_object: pointer(0, 2),
                // Points at a TextAsset, not a Mesh
                mesh: pointer(1, 3),
            },
        )
        .object(
            5,
            Texture2D {
                name: "tex".to_string(),
                width: 2,
                height: 1,
                image_count: 1,
                stream_data: StreamingInfo::new("archive:/CAB-main/CAB-main.resS", 4, 8),
                ..Default::default()
            },
        )
        .raw(6, class_id::MATERIAL, Stream::from_vec(vec![0; 12]))
        .build()
}

fn shared_asset() -> Stream {
    AssetBuilder::new()
        .object(
            2,
            TextAsset {
                name: "shared notes".to_string(),
                script: b"shared".to_vec(),
            },
        )
        .object(
            3,
            TextAsset {
                name: "not a mesh".to_string(),
                script: Vec::new(),
            },
        )
        .build()
}

fn main_bundle() -> Result<BundleFile> {
    bundle(vec![
        ("CAB-main", main_asset()),
        ("CAB-main.resS", Stream::from_vec(resource_bytes())),
    ])
}

fn shared_bundle() -> Result<BundleFile> {
    bundle(vec![("CAB-shared", shared_asset())])
}

#[test]
fn test_minimal_bundle_end_to_end() -> Result<()> {
    let empty = SerializedFile::new(22)?.serialize()?;
    let mut source = BundleFile::default();
    source.add_entry(BundleEntry::new("CAB-empty", empty));
    let bundle = BundleFile::from_stream(&source.serialize()?)?;
    assert_eq!(bundle.unity_version, "5.x.x");

    let mut environment = LinkedEnvironment::new();
    let manifest = environment.add_asset_bundle(&bundle)?;
    environment.link()?;

    assert!(manifest.is_none());
    assert_eq!(environment.soft_failures().count(), 0);
    assert_eq!(environment.assets().len(), 1);
    assert_eq!(environment.assets()[0].objects().count(), 0);
    Ok(())
}

#[test]
fn test_minimal_bundle_with_corrupt_hash() -> Result<()> {
    let mut source = BundleFile::default();
    source.directory_compression = CompressionType::None;
    source.add_entry(BundleEntry::new("CAB-empty", SerializedFile::new(22)?.serialize()?));

    let mut bytes = source.serialize()?.to_vec();
    // "UnityFS\0", version, "5.x.x\0", "\0", size, three u32 fields
    let hash_offset = 8 + 4 + 6 + 1 + 8 + 12;
    bytes[hash_offset] = 0xFF;
    assert!(matches!(
        BundleFile::from_bytes(bytes),
        Err(BinaryError::InvalidFormat(_))
    ));
    Ok(())
}

#[test]
fn test_pointers_resolve_within_and_across_assets() -> Result<()> {
    let mut environment = LinkedEnvironment::new();
    let manifest = environment.add_asset_bundle(&main_bundle()?)?;
    assert!(environment.add_asset_bundle(&shared_bundle()?)?.is_none());

    let manifest = manifest.expect("main bundle has a manifest");
    let bundle = environment.get::<AssetBundle>(manifest).expect("manifest is an AssetBundle");
    // Nothing is bound before linking
    assert!(bundle.preload_table.iter().all(|p| p.handle().is_none()));

    environment.link()?;

    let bundle = environment.get::<AssetBundle>(manifest).expect("manifest is an AssetBundle");
    let texture = environment
        .resolve_object(&bundle.container[0].1.asset)
        .and_then(object_cast::<Texture2D>)
        .expect("container entry resolves to the texture");
    assert_eq!(texture.name, "tex");

    let shared = environment
        .resolve_object(&bundle.preload_table[1])
        .and_then(object_cast::<TextAsset>)
        .expect("file ID 1 resolves through the external table");
    assert_eq!(shared.name, "shared notes");

    let main = environment.find_asset("archive:/CAB-main/CAB-main").expect("main asset");
    let game_object = environment
        .asset(main)
        .and_then(|asset| asset.object(2))
        .and_then(object_cast::<GameObject>)
        .expect("game object");
    let transform = environment
        .resolve_object(&game_object.components[0].component)
        .and_then(object_cast::<Transform>)
        .expect("first component is the transform");
    assert_eq!(
        environment.resolve(&transform.game_object).map(|g| g.name.as_str()),
        Some("Player")
    );
    assert!(transform.is_root());

    let filter = environment
        .resolve_object(&game_object.components[1].component)
        .and_then(object_cast::<MeshFilter>)
        .expect("second component is the mesh filter");
    assert!(filter.mesh.handle().is_none(), "a TextAsset is not a Mesh");

    // Only the unregistered Material is reported
    let failures: Vec<_> = environment.soft_failures().cloned().collect();
    assert_eq!(
        failures,
        vec![SoftFailure::UnregisteredClass {
            asset: "CAB-main".to_string(),
            path_id: 6,
            class_id: class_id::MATERIAL,
        }]
    );
    Ok(())
}

#[test]
fn test_streamed_texture_data() -> Result<()> {
    let mut environment = LinkedEnvironment::new();
    environment.add_asset_bundle(&main_bundle()?)?;
    environment.add_asset_bundle(&shared_bundle()?)?;

    let resource = environment
        .resolve_streamed_data_file("archive:/CAB-main/CAB-main.resS")
        .expect("resource registered by basename");
    assert_eq!(resource.len(), 32);
    assert!(environment.find_asset("CAB-main.resS").is_none());

    environment.link()?;
    let main = environment.find_asset("CAB-main").expect("main asset");
    let texture = environment
        .asset(main)
        .and_then(|asset| asset.object(5))
        .and_then(object_cast::<Texture2D>)
        .expect("texture");
    texture.validate_image_layout()?;
    assert_eq!(texture.image_data(), Some(&resource_bytes()[4..12]));
    Ok(())
}

#[test]
fn test_missing_external_then_relink() -> Result<()> {
    let mut environment = LinkedEnvironment::new();
    let manifest = environment.add_asset_bundle(&main_bundle()?)?.expect("manifest");
    environment.link()?;

    assert!(environment.soft_failures().any(|failure| matches!(
        failure,
        SoftFailure::UnresolvedExternal { path_name, .. } if path_name == "archive:/CAB-shared/CAB-shared"
    )));
    let bundle = environment.get::<AssetBundle>(manifest).expect("manifest");
    assert!(bundle.preload_table[1].handle().is_none());
    assert!(bundle.preload_table[0].handle().is_some());

    environment.add_asset_bundle(&shared_bundle()?)?;
    environment.link()?;
    assert_eq!(environment.soft_failures().count(), 1);
    let bundle = environment.get::<AssetBundle>(manifest).expect("manifest");
    assert!(bundle.preload_table[1].handle().is_some());
    Ok(())
}

#[test]
fn test_null_unknown_and_unavailable_targets() -> Result<()> {
    let asset = AssetBuilder::new()
        .object(
            1,
            PreloadData {
                name: String::new(),
                assets: vec![pointer(0, 0), pointer(0, 99), pointer(0, 2)],
                dependencies: Vec::new(),
                explicit_data_layout: false,
            },
        )
        .raw(2, class_id::SHADER, Stream::from_vec(vec![0; 4]))
        .build();

    let mut environment = LinkedEnvironment::new();
    let id = environment.add_asset("CAB-scene", &asset)?;
    environment.link()?;

    let loaded = environment.asset(id).expect("asset");
    assert!(loaded.object(0).is_none());
    let preload = loaded.object(1).and_then(object_cast::<PreloadData>).expect("preload data");
    assert!(preload.assets.iter().all(|p| p.handle().is_none()));

    let failures: Vec<_> = environment.soft_failures().cloned().collect();
    assert!(failures.contains(&SoftFailure::UnknownPathId {
        asset: "CAB-scene".to_string(),
        path_id: 99,
    }));
    assert!(failures.contains(&SoftFailure::ObjectUnavailable {
        asset: "CAB-scene".to_string(),
        path_id: 2,
    }));
    assert_eq!(failures.len(), 3);
    Ok(())
}

#[test]
fn test_out_of_range_file_id_is_fatal() -> Result<()> {
    let asset = AssetBuilder::new()
        .external("archive:/CAB-a/CAB-a")
        .object(
            1,
            Transform {
                father: pointer(2, 5),
                ..Default::default()
            },
        )
        .build();

    let mut environment = LinkedEnvironment::new();
    environment.add_asset("CAB-b", &asset)?;
    assert!(matches!(environment.link(), Err(BinaryError::InvalidFormat(_))));
    Ok(())
}

#[test]
fn test_missing_streamed_data_file() -> Result<()> {
    let asset = AssetBuilder::new()
        .object(
            1,
            Texture2D {
                name: "lost".to_string(),
                stream_data: StreamingInfo::new("archive:/CAB-x/CAB-x.resS", 0, 16),
                ..Default::default()
            },
        )
        .build();

    let mut environment = LinkedEnvironment::new();
    let id = environment.add_asset("CAB-x", &asset)?;
    environment.link()?;

    let texture = environment
        .asset(id)
        .and_then(|asset| asset.object(1))
        .and_then(object_cast::<Texture2D>)
        .expect("texture");
    assert_eq!(texture.image_data(), None);
    assert_eq!(
        environment.soft_failures().cloned().collect::<Vec<_>>(),
        vec![SoftFailure::UnresolvedStreamedData {
            asset: "CAB-x".to_string(),
            name: "archive:/CAB-x/CAB-x.resS".to_string(),
        }]
    );
    Ok(())
}

#[test]
fn test_failed_bundle_leaves_environment_untouched() -> Result<()> {
    let broken = bundle(vec![
        ("CAB-good", shared_asset()),
        ("CAB-good.resS", Stream::from_vec(resource_bytes())),
        ("CAB-bad", Stream::from_vec(vec![0xFF; 64])),
    ])?;

    let mut environment = LinkedEnvironment::new();
    assert!(environment.add_asset_bundle(&broken).is_err());
    assert!(environment.assets().is_empty());
    assert!(environment.find_asset("CAB-good").is_none());
    assert!(environment.resolve_streamed_data_file("CAB-good.resS").is_none());

    // A later good bundle gets the first arena slot
    let manifest = environment.add_asset_bundle(&main_bundle()?)?.expect("manifest");
    assert_eq!(manifest.asset.0, 0);
    Ok(())
}

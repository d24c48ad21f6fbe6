use std::{
    fs,
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc,
    },
};

use async_trait::async_trait;
use dirschema::{
    cache::{drivers, Cache},
    config::Config,
    schema::{Lookup, SchemaLookup, SchemaService, StampStatus, SubschemaLookup},
    Error,
};
use rstest::rstest;

/// Lookup that counts requests and can be switched offline.
struct DirectoryDouble {
    inner: SubschemaLookup,
    requests: AtomicUsize,
    offline: AtomicBool,
}

impl DirectoryDouble {
    fn new(object_classes: &[&str], attribute_types: &[&str]) -> Self {
        Self {
            inner: SubschemaLookup::new(
                object_classes.iter().map(ToString::to_string),
                attribute_types.iter().map(ToString::to_string),
            ),
            requests: AtomicUsize::new(0),
            offline: AtomicBool::new(false),
        }
    }

    fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    fn go_offline(&self) {
        self.offline.store(true, Ordering::SeqCst);
    }

    fn reach(&self, name: &str) -> Result<(), Error> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        if self.offline.load(Ordering::SeqCst) {
            return Err(Error::unavailable(name, "connection refused"));
        }
        Ok(())
    }
}

#[async_trait]
impl SchemaLookup for DirectoryDouble {
    type Error = Error;

    async fn object_class(&self, name: &str) -> Result<Lookup, Error> {
        self.reach(name)?;
        self.inner.object_class(name).await
    }

    async fn attribute_type(&self, name: &str) -> Result<Lookup, Error> {
        self.reach(name)?;
        self.inner.attribute_type(name).await
    }
}

const PERSON_CLASSES: &[&str] = &[
    "( 2.5.6.0 NAME 'top' ABSTRACT )",
    "( 2.5.6.6 NAME 'person' SUP top STRUCTURAL MUST ( cn $ sn ) MAY description )",
    "( 2.5.6.7 NAME 'organizationalPerson' SUP person STRUCTURAL MAY ( title $ telephoneNumber ) )",
];

const PERSON_ATTRIBUTES: &[&str] = &[
    "( 2.5.4.3 NAME ( 'cn' 'commonName' ) )",
    "( 2.5.4.4 NAME ( 'sn' 'surname' ) )",
    "( 2.5.4.13 NAME 'description' )",
    "( 2.5.4.12 NAME 'title' )",
    "( 2.5.4.20 NAME 'telephoneNumber' )",
];

fn person_directory() -> Arc<DirectoryDouble> {
    Arc::new(DirectoryDouble::new(PERSON_CLASSES, PERSON_ATTRIBUTES))
}

fn uncached(lookup: Arc<DirectoryDouble>) -> SchemaService {
    SchemaService::new(lookup, Cache::new(drivers::null::new()))
}

fn cache_tree() -> tree_fs::Tree {
    tree_fs::TreeBuilder::default()
        .drop(true)
        .add_file("cache/README", "resolution cache\n")
        .create()
        .expect("create temp tree")
}

#[tokio::test]
async fn resolves_person_hierarchy() {
    let service = uncached(person_directory());

    let ancestors = service
        .resolve_ancestors("organizationalPerson")
        .await
        .expect("ancestors");
    assert_eq!(ancestors, ["top", "person"]);

    let attributes = service
        .resolve_attributes("organizationalPerson", &ancestors)
        .await
        .expect("attributes");
    assert_eq!(attributes.required(), ["cn", "sn"]);
    assert_eq!(
        attributes.optional(),
        ["description", "title", "telephoneNumber"]
    );
}

#[tokio::test]
async fn cached_results_match_computed_ones() {
    let tree = cache_tree();
    let lookup = person_directory();
    let service = SchemaService::new(
        lookup.clone(),
        Cache::new(drivers::file::new(tree.root.join("cache"), "json")),
    );

    let ancestors = service
        .resolve_ancestors("organizationalPerson")
        .await
        .expect("ancestors");
    let attributes = service
        .resolve_attributes("organizationalPerson", &ancestors)
        .await
        .expect("attributes");
    assert!(lookup.requests() > 0);

    let stored = fs::read_to_string(tree.root.join("cache/parents_of_organizationalperson.json"))
        .expect("ancestor entry");
    assert_eq!(stored, r#"["top","person"]"#);
    assert!(tree
        .root
        .join("cache/attributes_of_organizationalperson.json")
        .exists());

    // Cache hits never reach the directory.
    lookup.go_offline();
    let before = lookup.requests();
    let cached_ancestors = service
        .resolve_ancestors("OrganizationalPerson")
        .await
        .expect("cached ancestors");
    let cached_attributes = service
        .resolve_attributes("organizationalPerson", &cached_ancestors)
        .await
        .expect("cached attributes");
    assert_eq!(lookup.requests(), before);
    assert_eq!(cached_ancestors, ancestors);
    assert_eq!(cached_attributes, attributes);
}

#[tokio::test]
async fn purge_forces_recomputation() {
    let tree = cache_tree();
    let lookup = person_directory();
    let service = SchemaService::new(
        lookup.clone(),
        Cache::new(drivers::file::new(tree.root.join("cache"), "json")),
    );

    service.resolve_ancestors("person").await.expect("ancestors");
    let entry = tree.root.join("cache/parents_of_person.json");
    assert!(entry.exists());

    service.purge_caches().await.expect("purge");
    assert!(!entry.exists());
    assert!(tree.root.join("cache/README").exists());

    lookup.go_offline();
    let err = service
        .resolve_ancestors("person")
        .await
        .expect_err("directory is offline");
    assert!(matches!(err, Error::LookupUnavailable { .. }));
}

#[tokio::test]
async fn cycles_terminate() {
    let service = uncached(Arc::new(DirectoryDouble::new(
        &[
            "( 1.1 NAME 'x' SUP y STRUCTURAL MUST a )",
            "( 1.2 NAME 'y' SUP x STRUCTURAL MAY b )",
        ],
        &["( 1.3 NAME 'a' )", "( 1.4 NAME 'b' )"],
    )));

    let ancestors = service.resolve_ancestors("x").await.expect("ancestors");
    assert_eq!(ancestors, ["top", "y"]);
    assert_eq!(
        service.resolve_ancestors("y").await.expect("ancestors"),
        ["top", "x"]
    );

    let attributes = service
        .resolve_attributes("x", &ancestors)
        .await
        .expect("attributes");
    assert_eq!(attributes.required(), ["a"]);
    assert_eq!(attributes.optional(), ["b"]);
}

#[tokio::test]
async fn cycles_through_numeric_oids_terminate() {
    let service = uncached(Arc::new(DirectoryDouble::new(
        &[
            "( 1.1 NAME 'x' SUP y STRUCTURAL MUST a )",
            "( 1.2 NAME 'y' SUP 1.1 STRUCTURAL MAY b )",
        ],
        &["( 1.3 NAME 'a' )", "( 1.4 NAME 'b' )"],
    )));

    let ancestors = service.resolve_ancestors("x").await.expect("ancestors");
    assert_eq!(ancestors, ["top", "y"]);

    let attributes = service
        .resolve_attributes("x", &ancestors)
        .await
        .expect("attributes");
    assert_eq!(attributes.required(), ["a"]);
    assert_eq!(attributes.optional(), ["b"]);
}

#[tokio::test]
async fn attributes_named_like_keywords_resolve() {
    let service = uncached(Arc::new(DirectoryDouble::new(
        &[
            "( 2.5.6.0 NAME 'top' ABSTRACT )",
            "( 1.1 NAME 'labeled' SUP top STRUCTURAL MUST cn MAY ( name $ description ) )",
        ],
        &[
            "( 2.5.4.41 NAME 'name' )",
            "( 2.5.4.3 NAME ( 'cn' 'commonName' ) SUP name )",
            "( 2.5.4.13 NAME 'description' )",
        ],
    )));

    let ancestors = service.resolve_ancestors("labeled").await.expect("ancestors");
    assert_eq!(ancestors, ["top"]);
    let attributes = service
        .resolve_attributes("labeled", &ancestors)
        .await
        .expect("attributes");
    assert_eq!(attributes.required(), ["cn"]);
    assert_eq!(attributes.optional(), ["name", "description"]);

    let cn = service
        .attribute_type("cn")
        .await
        .expect("lookup")
        .expect("attribute is defined");
    assert_eq!(cn.superior(), Some("name"));
}

#[tokio::test]
async fn shared_superiors_are_listed_once() {
    let service = uncached(Arc::new(DirectoryDouble::new(
        &[
            "( 1.1 NAME 'leaf' SUP ( left $ right ) MUST common MAY own )",
            "( 1.2 NAME 'left' SUP base MAY ( common $ shared ) )",
            "( 1.3 NAME 'right' SUP base MUST shared )",
            "( 1.4 NAME 'base' SUP top MUST shared MAY common )",
        ],
        &[
            "( 2.1 NAME 'common' )",
            "( 2.2 NAME 'shared' )",
            "( 2.3 NAME 'own' )",
        ],
    )));

    let ancestors = service.resolve_ancestors("leaf").await.expect("ancestors");
    assert_eq!(ancestors, ["top", "left", "base", "right"]);

    let attributes = service
        .resolve_attributes("leaf", &ancestors)
        .await
        .expect("attributes");
    assert_eq!(attributes.required(), ["common"]);
    assert_eq!(attributes.optional(), ["shared", "own"]);
}

#[rstest]
#[case("device")]
#[case("DEVICE")]
#[tokio::test]
async fn unknown_classes_resolve_to_root(#[case] class: &str) {
    let tree = cache_tree();
    let service = SchemaService::new(
        person_directory(),
        Cache::new(drivers::file::new(tree.root.join("cache"), "json")),
    );

    let ancestors = service.resolve_ancestors(class).await.expect("ancestors");
    assert_eq!(ancestors, ["top"]);
    let attributes = service
        .resolve_attributes(class, &ancestors)
        .await
        .expect("attributes");
    assert!(attributes.is_empty());

    assert!(!tree.root.join("cache/parents_of_device.json").exists());
    assert!(!tree.root.join("cache/attributes_of_device.json").exists());
}

#[tokio::test]
async fn root_class_has_no_ancestors() {
    let service = uncached(person_directory());
    assert!(service
        .resolve_ancestors("top")
        .await
        .expect("ancestors")
        .is_empty());
}

#[tokio::test]
async fn unconfirmed_tokens_are_dropped() {
    let service = uncached(Arc::new(DirectoryDouble::new(
        &[
            "( 2.5.6.6 NAME 'person' SUP top STRUCTURAL MUST ( cn $ sn ) )",
            "( 1.1 NAME 'staff' SUP ( person $ ghost ) MUST ( cn $ badge ) MAY ( mayContact $ supportedAlgorithms ) )",
        ],
        &[
            "( 2.5.4.3 NAME 'cn' )",
            "( 2.5.4.4 NAME 'sn' )",
            "( 1.2 NAME 'mayContact' )",
            "( 1.3 NAME 'supportedAlgorithms' )",
        ],
    )));

    let ancestors = service.resolve_ancestors("staff").await.expect("ancestors");
    assert_eq!(ancestors, ["top", "person"]);

    let attributes = service
        .resolve_attributes("staff", &ancestors)
        .await
        .expect("attributes");
    assert_eq!(attributes.required(), ["cn", "sn"]);
    assert_eq!(attributes.optional(), ["mayContact", "supportedAlgorithms"]);
}

#[tokio::test]
async fn unavailable_directory_aborts_resolution() {
    let lookup = person_directory();
    lookup.go_offline();
    let service = uncached(lookup);

    let err = service
        .resolve_ancestors("organizationalPerson")
        .await
        .expect_err("directory is offline");
    assert!(matches!(
        err,
        Error::LookupUnavailable { ref name, .. } if name == "organizationalPerson"
    ));

    assert!(service
        .resolve_attributes("person", &["top".to_string()])
        .await
        .is_err());
}

#[tokio::test]
async fn invalid_names_cannot_reach_the_cache_directory() {
    let service = uncached(person_directory());
    assert!(matches!(
        service.resolve_ancestors("../person").await,
        Err(Error::CacheKey(_))
    ));
    assert!(matches!(
        service.resolve_ancestors("").await,
        Err(Error::CacheKey(_))
    ));
}

const SCHEMA_V1: &str = "\
dn: cn=subschema
modifyTimestamp: 20240101000000Z
objectClasses: ( 2.5.6.6 NAME 'person' SUP top STRUCTURAL MUST cn )
attributeTypes: ( 2.5.4.3 NAME 'cn' )
attributeTypes: ( 2.5.4.4 NAME 'sn' )
";

const SCHEMA_V2: &str = "\
dn: cn=subschema
modifyTimestamp: 20240202000000Z
objectClasses: ( 2.5.6.6 NAME 'person' SUP top STRUCTURAL MUST ( cn $ sn ) )
attributeTypes: ( 2.5.4.3 NAME 'cn' )
attributeTypes: ( 2.5.4.4 NAME 'sn' )
";

#[tokio::test]
async fn schema_changes_invalidate_file_cache() {
    let tree = tree_fs::TreeBuilder::default()
        .drop(true)
        .add_file("schema/subschema.ldif", SCHEMA_V1)
        .create()
        .expect("create temp tree");

    let config: Config = format!(
        "cache:\n  driver: file\n  dir: {}\nschema:\n  source: {}\n",
        tree.root.join("cache").display(),
        tree.root.join("schema/subschema.ldif").display(),
    )
    .parse()
    .expect("config");

    let service = SchemaService::from_config(&config).await.expect("service");
    let ancestors = service.resolve_ancestors("person").await.expect("ancestors");
    let attributes = service
        .resolve_attributes("person", &ancestors)
        .await
        .expect("attributes");
    assert_eq!(attributes.required(), ["cn"]);
    assert_eq!(
        service.sync_schema_stamp().await.expect("stamp"),
        StampStatus::Unchanged
    );

    fs::write(tree.root.join("schema/subschema.ldif"), SCHEMA_V2).expect("update schema");
    let service = SchemaService::from_config(&config).await.expect("service");
    let attributes = service
        .resolve_attributes("person", &ancestors)
        .await
        .expect("attributes");
    assert_eq!(attributes.required(), ["cn", "sn"]);
}

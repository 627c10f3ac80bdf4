//! End-to-end scenarios over repeated incremental builds: merge, prune,
//! persist, reload and resolve.

use std::collections::BTreeSet;

use tally_artifact::{
    ArtifactLocation, ArtifactRecord, LocalArtifact, ParserRegistry, RemoteArtifact,
};
use tally_common::TargetSet;
use tally_index::{
    decode, decode_legacy_remote, encode, RemoteOutputArtifacts, TargetSetIndex,
    TrackedOutputArtifacts,
};

fn set(labels: &[&str]) -> TargetSet {
    labels.iter().copied().collect()
}

fn local(path: &str) -> ArtifactRecord {
    LocalArtifact::new(format!("/output_base/execroot/blaze-out/{path}"), path).into()
}

fn remote(path: &str) -> ArtifactRecord {
    RemoteArtifact::new(path, 10, format!("bytestream://cas/{path}"), "digest").into()
}

fn build<const N: usize>(entries: &[([&str; N], &str)]) -> TargetSetIndex {
    entries
        .iter()
        .map(|(labels, path)| (set(labels), remote(path)))
        .collect()
}

fn paths_for(index: &TargetSetIndex, label: &str) -> BTreeSet<String> {
    index
        .artifacts_for_target(label)
        .into_iter()
        .map(|a| a.relative_path().to_string())
        .collect()
}

fn strings(paths: &[&str]) -> BTreeSet<String> {
    paths.iter().map(|s| s.to_string()).collect()
}

#[test]
fn refreshing_a_target_drops_its_old_outputs() {
    let index = build(&[(["//a"], "k8-opt/bin/art1")]);
    let merged = index.append_new_outputs(&build(&[(["//a", "//b"], "k8-opt/bin/art2")]));

    assert_eq!(merged, build(&[(["//a", "//b"], "k8-opt/bin/art2")]));
    assert!(merged
        .iter()
        .all(|(targets, a)| targets.is_empty() || a.relative_path() != "k8-opt/bin/art1"));
}

#[test]
fn three_build_cycles() {
    // Sync 1: full build of //app and //lib.
    let index = TargetSetIndex::empty().append_new_outputs(&build(&[
        (["//app", "//lib"], "k8-opt/bin/lib/liblib.jar"),
        (["//app", "//lib"], "k8-opt/bin/app/app.jar"),
    ]));
    assert_eq!(index.len(), 2);

    // Sync 2: only //app rebuilt; its jar moved, the shared lib jar is still
    // claimed by //lib.
    let index = index.append_new_outputs(&build(&[(["//app"], "k8-opt/bin/app/app_v2.jar")]));
    assert_eq!(
        paths_for(&index, "//app"),
        strings(&["k8-opt/bin/app/app_v2.jar"])
    );
    assert_eq!(
        paths_for(&index, "//lib"),
        strings(&["k8-opt/bin/app/app.jar", "k8-opt/bin/lib/liblib.jar"])
    );

    // Sync 3: //lib removed from the project.
    let index = index.remove_untracked_outputs(["//app"]);
    assert!(paths_for(&index, "//lib").is_empty());
    assert_eq!(index.unattributed().map(BTreeSet::len), Some(2));
    assert_eq!(index.without_unattributed().len(), 1);
}

#[test]
fn persisted_index_survives_reload_and_resolves() {
    let index = TargetSetIndex::from_entries([
        (set(&["//pkg:foo"]), local("k8-opt/bin/pkg/foo.jar")),
        (set(&["//pkg:old"]), remote("k8-opt/pkg/old.jar")),
        (set(&["//pkg:gen"]), remote("k8-opt/genfiles/pkg/gen.h")),
        (set(&["//pkg:gen"]), remote("k8-fastbuild/bin/pkg/other.jar")),
    ]);

    let json = serde_json::to_string(&encode(&index)).unwrap();
    let wire: TrackedOutputArtifacts = serde_json::from_str(&json).unwrap();
    let reloaded = decode(&wire, &ParserRegistry::standard(), None).unwrap();

    assert_eq!(reloaded, index);
    assert!(reloaded.has_remote_outputs());
    assert!(reloaded.find_output_artifact("k8-opt/bin/pkg/foo.jar").is_some());
    assert_eq!(
        reloaded
            .find_output_artifact("k8-opt/bin/pkg/old.jar")
            .map(ArtifactRecord::relative_path),
        Some("k8-opt/pkg/old.jar")
    );
    assert_eq!(
        reloaded
            .resolve_genfiles_path("pkg/gen.h")
            .map(ArtifactRecord::relative_path),
        Some("k8-opt/genfiles/pkg/gen.h")
    );
    let location = ArtifactLocation::generated("blaze-out/k8-opt/bin", "pkg/foo.jar");
    assert!(reloaded.find_output_artifact_at(&location).is_some());
}

#[test]
fn legacy_state_is_replaced_by_first_real_sync() {
    let legacy: RemoteOutputArtifacts = serde_json::from_str(
        r#"{"artifacts": [
            {"relative_path": "k8-opt/bin/old.jar", "length": 3},
            {"relative_path": "k8-opt/bin/keep.jar"}
        ]}"#,
    )
    .unwrap();
    let index = decode_legacy_remote(&legacy, &ParserRegistry::standard());
    assert_eq!(index.unattributed().map(BTreeSet::len), Some(2));
    assert!(index.find_output_artifact("k8-opt/bin/old.jar").is_some());

    let synced = index.append_new_outputs(&build(&[(["//a"], "k8-opt/bin/keep.jar")]));
    assert!(synced.unattributed().is_none());
    assert!(synced.get("k8-opt/bin/old.jar").is_none());
    assert_eq!(
        synced.get("k8-opt/bin/keep.jar").map(ArtifactRecord::length),
        Some(10)
    );
}

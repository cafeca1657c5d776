use std::fs;
use std::path::Path;

use tracing::Span;
use wr_app::{AppError, SetDirectionRequest, set_direction};
use wr_bc::{BcError, Octant};
use wr_case::boundary::read_patch_type;

fn field(object: &str) -> String {
    let mut text = format!("FoamFile\n{{\n    object      {object};\n}}\n\nboundaryField\n{{\n");
    for name in ["terrain", "north", "east", "south", "west"] {
        text.push_str(&format!("    {name}\n    {{\n        type            zeroGradient;\n    }}\n"));
    }
    text.push_str("}\n");
    text
}

fn make_case(root: &Path) {
    fs::create_dir_all(root.join("system")).unwrap();
    fs::create_dir_all(root.join("0")).unwrap();
    fs::create_dir_all(root.join("100")).unwrap();
    for name in ["U", "p"] {
        fs::write(root.join("0").join(name), field(name)).unwrap();
    }
}

fn archive_pair(root: &Path, pair: &str, marker: &str) {
    let dir = root.join("flowArchive").join(pair);
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("U"), format!("{}// {marker}\n", field("U"))).unwrap();
}

#[test]
fn rewrites_initial_boundaries_and_prunes() {
    let tmp = tempfile::tempdir().unwrap();
    make_case(tmp.path());

    let outcome = set_direction(
        &SetDirectionRequest {
            case_root: tmp.path().to_path_buf(),
            direction: 270.0,
            speed: None,
            archive: None,
        },
        Span::none(),
    )
    .unwrap();

    assert_eq!(outcome.octant, Octant::W);
    let backup = tmp.path().join(wr_case::BACKUP_DIR_NAME).join("U");
    assert_eq!(fs::read_to_string(backup).unwrap(), field("U"));
    assert!(outcome.restored.is_empty());
    assert!(!tmp.path().join("100").exists());
    let u = fs::read_to_string(tmp.path().join("0").join("U")).unwrap();
    assert_eq!(
        read_patch_type(&u, "west").unwrap().as_deref(),
        Some("atmBoundaryLayerInletVelocity")
    );
    assert_eq!(read_patch_type(&u, "terrain").unwrap().as_deref(), Some("zeroGradient"));
}

#[test]
fn restores_the_pair_from_an_archive() {
    let tmp = tempfile::tempdir().unwrap();
    make_case(tmp.path());
    archive_pair(tmp.path(), "wspeed_5.0_wdir_45", "from archive");

    let outcome = set_direction(
        &SetDirectionRequest {
            case_root: tmp.path().to_path_buf(),
            direction: 45.0,
            speed: Some(5.0),
            archive: Some("flowArchive".into()),
        },
        Span::none(),
    )
    .unwrap();

    assert_eq!(outcome.octant, Octant::NE);
    assert_eq!(outcome.restored, vec!["U"]);
    let u = fs::read_to_string(tmp.path().join("0").join("U")).unwrap();
    assert!(u.contains("// from archive"));
}

#[test]
fn archive_without_speed_is_rejected_untouched() {
    let tmp = tempfile::tempdir().unwrap();
    make_case(tmp.path());
    archive_pair(tmp.path(), "wspeed_5.0_wdir_45", "x");

    let err = set_direction(
        &SetDirectionRequest {
            case_root: tmp.path().to_path_buf(),
            direction: 45.0,
            speed: None,
            archive: Some("flowArchive".into()),
        },
        Span::none(),
    )
    .unwrap_err();

    assert!(matches!(err, AppError::InvalidInput(_)));
    assert!(tmp.path().join("100").exists());
}

#[test]
fn missing_archive_directory_is_reported() {
    let tmp = tempfile::tempdir().unwrap();
    make_case(tmp.path());

    let err = set_direction(
        &SetDirectionRequest {
            case_root: tmp.path().to_path_buf(),
            direction: 0.0,
            speed: Some(3.0),
            archive: Some("noSuchArchive".into()),
        },
        Span::none(),
    )
    .unwrap_err();

    assert!(matches!(err, AppError::ArchiveNotFound { .. }));
}

#[test]
fn out_of_range_direction_leaves_the_case_alone() {
    let tmp = tempfile::tempdir().unwrap();
    make_case(tmp.path());

    let err = set_direction(
        &SetDirectionRequest {
            case_root: tmp.path().to_path_buf(),
            direction: 400.0,
            speed: None,
            archive: None,
        },
        Span::none(),
    )
    .unwrap_err();

    assert!(matches!(err, AppError::Bc(BcError::InvalidDirection { .. })));
    assert!(tmp.path().join("100").exists());
    assert!(!tmp.path().join(wr_case::BACKUP_DIR_NAME).exists());
    assert_eq!(fs::read_to_string(tmp.path().join("0").join("U")).unwrap(), field("U"));
}

#[test]
fn existing_backup_is_kept() {
    let tmp = tempfile::tempdir().unwrap();
    make_case(tmp.path());
    let backup = tmp.path().join(wr_case::BACKUP_DIR_NAME);
    fs::create_dir_all(&backup).unwrap();
    fs::write(backup.join("U"), "original").unwrap();

    set_direction(
        &SetDirectionRequest {
            case_root: tmp.path().to_path_buf(),
            direction: 90.0,
            speed: None,
            archive: None,
        },
        Span::none(),
    )
    .unwrap();

    assert_eq!(fs::read_to_string(backup.join("U")).unwrap(), "original");
}

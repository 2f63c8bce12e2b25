//! End-to-end pipeline tests: build, split, repackage.

use std::fs::{self, File};
use std::io::Read;
use std::num::NonZeroU64;
use std::path::Path;

use capzip_core::{
    ArchiveExt, ArchiveJob, ArchivePipeline, CapzipError, FallbackCeiling, PipelineConfig,
    PipelineState, Repackager, SizeCeiling, SizeEnforcer, Stage, ZipContainerWriter, list_entries,
    rejoin,
};
use tempfile::TempDir;
use zip::{CompressionMethod, ZipArchive};

mod common;
use common::{names_in, noise, write_file};

fn pipeline_in(work: &Path) -> ArchivePipeline<ZipContainerWriter> {
    let config = PipelineConfig {
        work_dir: work.to_path_buf(),
        deterministic: true,
        ..Default::default()
    };
    ArchivePipeline::new(
        ZipContainerWriter::new(None, true),
        SizeEnforcer::new(),
        Repackager::new(ZipContainerWriter::stored(true)),
        config,
    )
}

fn read_entry(archive: &Path, name: &str) -> Vec<u8> {
    let mut zr = ZipArchive::new(File::open(archive).unwrap()).unwrap();
    let mut f = zr.by_name(name).unwrap();
    let mut out = Vec::new();
    f.read_to_end(&mut out).unwrap();
    out
}

fn bytes(n: u64) -> SizeCeiling {
    SizeCeiling::Bytes(NonZeroU64::new(n).unwrap())
}

#[test]
fn unlimited_ceiling_yields_single_container() {
    let src = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();
    let a = write_file(src.path(), "a.txt", &noise(5000, 1));
    let b = write_file(src.path(), "b.txt", &noise(5000, 2));

    let job = ArchiveJob::new(vec![a.clone(), b.clone()], ArchiveExt::Zip, SizeCeiling::Unlimited);
    let mut p = pipeline_in(work.path());
    let fin = p.run(&job).unwrap();

    assert_eq!(p.state(), PipelineState::Done);
    assert!(!fin.was_split());
    assert_eq!(fin.path, work.path().join("output.zip"));
    assert_eq!(names_in(work.path()), vec!["output.zip"]);

    let rows = list_entries(&fin.path).unwrap();
    assert_eq!(rows.len(), 2);
    let a_name = rows[0].name.clone();
    let b_name = rows[1].name.clone();
    assert!(a_name.ends_with("a.txt"));
    assert!(b_name.ends_with("b.txt"));
    assert_eq!(read_entry(&fin.path, &a_name), fs::read(&a).unwrap());
    assert_eq!(read_entry(&fin.path, &b_name), fs::read(&b).unwrap());
    assert_eq!(fin.stats.files, 2);
    assert_eq!(fin.stats.logical_bytes, 10_000);
}

#[test]
fn container_under_ceiling_is_not_split() {
    let src = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();
    let a = write_file(src.path(), "a.txt", &vec![b'a'; 20_000]);

    let job = ArchiveJob::new(vec![a], ArchiveExt::SevenZ, SizeCeiling::from_kib(64));
    let fin = pipeline_in(work.path()).run(&job).unwrap();
    assert!(!fin.was_split());
    assert_eq!(names_in(work.path()), vec!["output.7z"]);
}

#[test]
fn oversize_container_is_split_and_repackaged() {
    let src = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();
    let big = write_file(src.path(), "big.bin", &noise(10_000, 7));

    let job = ArchiveJob::new(vec![big], ArchiveExt::Zip, bytes(4000));
    let mut p = pipeline_in(work.path());
    let fin = p.run(&job).unwrap();

    assert_eq!(p.state(), PipelineState::Done);
    assert_eq!(fin.path, work.path().join("final_output.zip"));
    assert_eq!(names_in(work.path()), vec!["final_output.zip"]);

    let report = fin.split.as_ref().unwrap();
    let total = report.container_len;
    assert!(total > 10_000, "noise should not compress: {total}");
    let n = total.div_ceil(4000) as usize;
    assert_eq!(report.parts.len(), n);
    for part in &report.parts[..n - 1] {
        assert_eq!(part.len, 4000);
    }
    let last = total % 4000;
    assert_eq!(report.parts[n - 1].len, if last == 0 { 4000 } else { last });

    let names: Vec<String> = list_entries(&fin.path)
        .unwrap()
        .into_iter()
        .map(|r| r.name)
        .collect();
    let expected: Vec<String> = (0..n).map(|i| format!("output.zip{i:03}")).collect();
    assert_eq!(names, expected);
    let mut zr = ZipArchive::new(File::open(&fin.path).unwrap()).unwrap();
    for i in 0..zr.len() {
        assert_eq!(zr.by_index(i).unwrap().compression(), CompressionMethod::Stored);
    }

    // concatenated parts form a readable zip holding the original file
    let mut joined = Vec::new();
    for name in &expected {
        joined.extend(read_entry(&fin.path, name));
    }
    assert_eq!(joined.len() as u64, total);
    let restored = work.path().join("restored.zip");
    fs::write(&restored, &joined).unwrap();
    let mut zr = ZipArchive::new(File::open(&restored).unwrap()).unwrap();
    assert_eq!(zr.len(), 1);
    let mut inner = Vec::new();
    zr.by_index(0).unwrap().read_to_end(&mut inner).unwrap();
    assert_eq!(inner, noise(10_000, 7));
}

#[test]
fn rejoin_matches_split_digest() {
    let src = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    let big = write_file(src.path(), "big.bin", &noise(30_000, 11));

    let job = ArchiveJob::new(vec![big], ArchiveExt::SevenZ, bytes(1000));
    let fin = pipeline_in(work.path()).run(&job).unwrap();
    let report = fin.split.unwrap();

    let joined = out.path().join("output.7z");
    let r = rejoin(&fin.path, &joined).unwrap();
    assert_eq!(r.parts, report.parts.len());
    assert_eq!(r.bytes, report.container_len);
    assert_eq!(r.digest, report.digest);
    assert_eq!(*blake3::hash(&fs::read(&joined).unwrap()).as_bytes(), report.digest);
}

#[test]
fn invalid_ceilings_behave_like_unlimited() {
    let src = TempDir::new().unwrap();
    let a = write_file(src.path(), "a.bin", &noise(8000, 3));

    for input in ["0", "-1", "ten", ""] {
        let work = TempDir::new().unwrap();
        let ceiling = SizeCeiling::parse_kib_or(input, FallbackCeiling::Unlimited);
        assert_eq!(ceiling, SizeCeiling::Unlimited);
        let job = ArchiveJob::new(vec![a.clone()], ArchiveExt::Zip, ceiling);
        let fin = pipeline_in(work.path()).run(&job).unwrap();
        assert!(!fin.was_split(), "{input:?}");
        assert_eq!(names_in(work.path()), vec!["output.zip"]);
    }
}

#[test]
fn missing_source_fails_before_writing() {
    let src = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();
    let a = write_file(src.path(), "a.txt", b"present");
    let ghost = src.path().join("ghost.txt");

    let job = ArchiveJob::new(vec![a, ghost.clone()], ArchiveExt::Zip, SizeCeiling::Unlimited);
    let mut p = pipeline_in(work.path());
    let err = p.run(&job).unwrap_err();

    assert!(matches!(&err, CapzipError::SourceNotFound { path } if *path == ghost));
    assert_eq!(err.stage(), Some(Stage::Build));
    assert_eq!(p.state(), PipelineState::Failed { stage: Stage::Build });
    assert!(names_in(work.path()).is_empty());
}

#[test]
fn directory_source_is_rejected() {
    let src = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();
    let job = ArchiveJob::new(
        vec![src.path().to_path_buf()],
        ArchiveExt::Zip,
        SizeCeiling::Unlimited,
    );
    let err = pipeline_in(work.path()).run(&job).unwrap_err();
    assert!(matches!(err, CapzipError::NotAFile { .. }));
    assert!(names_in(work.path()).is_empty());
}

#[test]
fn blocked_part_path_fails_split_and_keeps_container() {
    let src = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();
    let big = write_file(src.path(), "big.bin", &noise(6000, 5));
    // a directory squatting on the second part's name
    fs::create_dir(work.path().join("output.zip001")).unwrap();

    let job = ArchiveJob::new(vec![big], ArchiveExt::Zip, bytes(2000));
    let mut p = pipeline_in(work.path());
    let err = p.run(&job).unwrap_err();

    match &err {
        CapzipError::PartWrite { path, .. } => {
            assert_eq!(path, &work.path().join("output.zip001"))
        }
        other => panic!("expected PartWrite, got {other:?}"),
    }
    assert_eq!(p.state(), PipelineState::Failed { stage: Stage::Split });
    assert!(work.path().join("output.zip").exists());
    assert!(!work.path().join("final_output.zip").exists());
}

#[test]
fn blocked_final_path_fails_repackage_and_keeps_parts() {
    let src = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();
    let big = write_file(src.path(), "big.bin", &noise(6000, 9));
    fs::create_dir(work.path().join("final_output.zip")).unwrap();

    let job = ArchiveJob::new(vec![big], ArchiveExt::Zip, bytes(2000));
    let mut p = pipeline_in(work.path());
    let err = p.run(&job).unwrap_err();

    assert!(matches!(err, CapzipError::Repackage { .. }), "{err:?}");
    assert_eq!(err.stage(), Some(Stage::Repackage));
    assert_eq!(err.path(), Some(work.path().join("final_output.zip").as_path()));
    assert_eq!(p.state(), PipelineState::Failed { stage: Stage::Repackage });

    let names = names_in(work.path());
    let parts: Vec<&String> = names.iter().filter(|n| n.starts_with("output.zip0")).collect();
    assert!(parts.len() >= 3, "{names:?}");
    assert!(!names.contains(&"output.zip".to_string()));
}

#[test]
fn unwritable_work_dir_fails_build_at_container_path() {
    let src = TempDir::new().unwrap();
    let scratch = TempDir::new().unwrap();
    let a = write_file(src.path(), "a.txt", b"payload");
    // a regular file where the work directory should be
    let work = write_file(scratch.path(), "work", b"not a dir");

    let job = ArchiveJob::new(vec![a], ArchiveExt::Zip, SizeCeiling::Unlimited);
    let mut p = pipeline_in(&work);
    let err = p.run(&job).unwrap_err();

    let container = work.join("output.zip");
    assert!(matches!(&err, CapzipError::Build { path, .. } if *path == container), "{err:?}");
    assert_eq!(err.stage(), Some(Stage::Build));
    assert_eq!(p.state(), PipelineState::Failed { stage: Stage::Build });
}

#[test]
fn sources_flattening_to_one_name_are_all_kept() {
    let src = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();
    let top = write_file(src.path(), "a.txt", b"top level");
    fs::create_dir(src.path().join("sub")).unwrap();
    let nested = write_file(&src.path().join("sub"), "a.txt", b"nested");
    // `sub/../a.txt` and `a.txt` differ only by dropped components
    let dotted = src.path().join("sub").join("..").join("a.txt");

    let job = ArchiveJob::new(
        vec![top, dotted, nested],
        ArchiveExt::Zip,
        SizeCeiling::Unlimited,
    );
    let mut p = pipeline_in(work.path());
    let fin = p.run(&job).unwrap();
    assert_eq!(p.state(), PipelineState::Done);

    let rows = list_entries(&fin.path).unwrap();
    assert_eq!(rows.len(), 3);
    let names: Vec<&str> = rows.iter().map(|r| r.name.as_str()).collect();
    assert!(names[0].ends_with("/a.txt"), "{names:?}");
    assert!(names[1].ends_with("/sub/a.txt"), "{names:?}");
    assert!(names[2].ends_with("/sub/a~1.txt"), "{names:?}");
    assert_eq!(read_entry(&fin.path, names[0]), b"top level");
    assert_eq!(read_entry(&fin.path, names[1]), b"top level");
    assert_eq!(read_entry(&fin.path, names[2]), b"nested");
}

#[test]
fn same_source_listed_twice_gets_two_entries() {
    let src = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();
    let a = write_file(src.path(), "a.txt", b"twice");

    let job = ArchiveJob::new(vec![a.clone(), a], ArchiveExt::Zip, SizeCeiling::Unlimited);
    let fin = pipeline_in(work.path()).run(&job).unwrap();

    let rows = list_entries(&fin.path).unwrap();
    assert_eq!(rows.len(), 2);
    assert!(rows[0].name.ends_with("/a.txt"));
    assert!(rows[1].name.ends_with("/a~1.txt"));
    for row in &rows {
        assert_eq!(read_entry(&fin.path, &row.name), b"twice");
    }
}

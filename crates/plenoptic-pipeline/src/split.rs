//! Train/test partition of `meta.json` along the camera axis.

use std::path::Path;

use anyhow::{Context, Result};
use thiserror::Error;

use crate::io::{read_json, write_json};
use crate::metadata::{MetaJson, MetadataError};

pub const META_FILE: &str = "meta.json";
pub const TRAIN_META_FILE: &str = "train_meta.json";
pub const TEST_META_FILE: &str = "test_meta.json";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SplitError {
    #[error("test camera {index} is out of range for {count} cameras")]
    OutOfRange { index: usize, count: usize },
    #[error("test camera {0} is listed more than once")]
    Duplicate(usize),
    #[error("malformed metadata: {0}")]
    Shape(#[from] MetadataError),
}

fn select<T: Clone>(rows: &[Vec<T>], cameras: &[usize]) -> Vec<Vec<T>> {
    rows.iter()
        .map(|row| cameras.iter().map(|&c| row[c].clone()).collect())
        .collect()
}

fn subset(meta: &MetaJson, cameras: &[usize]) -> MetaJson {
    let frames = meta.num_frames();
    let k = meta.k[0][0];
    MetaJson {
        w: meta.w,
        h: meta.h,
        k: vec![vec![k; cameras.len()]; frames],
        w2c: select(&meta.w2c, cameras),
        file_names: select(&meta.file_names, cameras),
        cam_id: vec![cameras.to_vec(); frames],
    }
}

/// Split `meta` into `(train, test)` by camera index.
///
/// Test indices are sorted; the train set is their complement over
/// `[0, cameras)`. Intrinsics are re-tiled from the first entry and the
/// camera IDs of each side are the selected original indices.
pub fn split_train_test(meta: &MetaJson, test: &[usize]) -> Result<(MetaJson, MetaJson), SplitError> {
    meta.validate()?;
    let count = meta.num_cameras();

    let mut test_cameras = test.to_vec();
    test_cameras.sort_unstable();
    if let Some(&index) = test_cameras.iter().find(|&&i| i >= count) {
        return Err(SplitError::OutOfRange { index, count });
    }
    if let Some(pair) = test_cameras.windows(2).find(|w| w[0] == w[1]) {
        return Err(SplitError::Duplicate(pair[0]));
    }
    let train_cameras: Vec<usize> = (0..count)
        .filter(|c| test_cameras.binary_search(c).is_err())
        .collect();

    log::debug!("train cameras {train_cameras:?}, test cameras {test_cameras:?}");
    Ok((subset(meta, &train_cameras), subset(meta, &test_cameras)))
}

/// Read `meta.json` from `dir` and write `train_meta.json` / `test_meta.json`.
///
/// Nothing is written if the split is invalid.
pub fn split_dataset_dir(dir: &Path, test: &[usize]) -> Result<(MetaJson, MetaJson)> {
    let meta: MetaJson = read_json(&dir.join(META_FILE))?;
    let (train, test) = split_train_test(&meta, test)
        .with_context(|| format!("cannot split {}", dir.join(META_FILE).display()))?;
    write_json(&dir.join(TRAIN_META_FILE), &train)?;
    write_json(&dir.join(TEST_META_FILE), &test)?;
    log::info!(
        "split {} into {} train / {} test cameras",
        dir.display(),
        train.cam_id.first().map_or(0, Vec::len),
        test.cam_id.first().map_or(0, Vec::len)
    );
    Ok((train, test))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(frames: usize, cameras: usize) -> MetaJson {
        let k = [[100.0, 0.0, 50.0], [0.0, 100.0, 40.0], [0.0, 0.0, 1.0]];
        let w2c = |t: usize, c: usize| {
            let mut m = [[0.0; 4]; 4];
            for (i, row) in m.iter_mut().enumerate() {
                row[i] = 1.0;
            }
            m[0][3] = c as f64;
            m[1][3] = t as f64;
            m
        };
        MetaJson {
            w: 100,
            h: 80,
            k: vec![vec![k; cameras]; frames],
            w2c: (0..frames)
                .map(|t| (0..cameras).map(|c| w2c(t, c)).collect())
                .collect(),
            file_names: (0..frames)
                .map(|t| (0..cameras).map(|c| format!("{c}/{t:06}.png")).collect())
                .collect(),
            cam_id: vec![(0..cameras).collect(); frames],
        }
    }

    #[test]
    fn five_cameras_test_one_and_three() {
        let (train, test) = split_train_test(&meta(2, 5), &[3, 1]).unwrap();
        assert_eq!(train.cam_id, vec![vec![0, 2, 4]; 2]);
        assert_eq!(test.cam_id, vec![vec![1, 3]; 2]);
        assert_eq!(test.file_names[1], vec!["1/000001.png", "3/000001.png"]);
        assert_eq!(train.w2c[0][2][0][3], 4.0);
        assert_eq!(train.k[1].len(), 3);
        assert_eq!(test.k[0].len(), 2);
        assert_eq!((train.w, train.h), (100, 80));
    }

    #[test]
    fn partition_is_complete_and_disjoint() {
        let full = meta(1, 6);
        for test in [vec![], vec![0], vec![5, 0, 2], (0..6).collect::<Vec<_>>()] {
            let (train, test_meta) = split_train_test(&full, &test).unwrap();
            assert_eq!(train.w2c[0].len() + test_meta.w2c[0].len(), 6);
            for id in &train.cam_id[0] {
                assert!(!test_meta.cam_id[0].contains(id));
            }
        }
    }

    #[test]
    fn invalid_indices_are_rejected() {
        let full = meta(1, 3);
        assert_eq!(
            split_train_test(&full, &[0, 3]),
            Err(SplitError::OutOfRange { index: 3, count: 3 })
        );
        assert_eq!(split_train_test(&full, &[1, 1]), Err(SplitError::Duplicate(1)));

        let mut ragged = full.clone();
        ragged.file_names[0].pop();
        assert!(matches!(
            split_train_test(&ragged, &[0]),
            Err(SplitError::Shape(_))
        ));
    }

    #[test]
    fn dataset_dir_split_writes_nothing_on_error() -> Result<()> {
        let dir = tempfile::tempdir()?;
        write_json(&dir.path().join(META_FILE), &meta(3, 4))?;

        assert!(split_dataset_dir(dir.path(), &[9]).is_err());
        assert!(!dir.path().join(TRAIN_META_FILE).exists());
        assert!(!dir.path().join(TEST_META_FILE).exists());

        split_dataset_dir(dir.path(), &[2])?;
        let test: MetaJson = read_json(&dir.path().join(TEST_META_FILE))?;
        assert_eq!(test.cam_id, vec![vec![2]; 3]);
        let train: MetaJson = read_json(&dir.path().join(TRAIN_META_FILE))?;
        assert_eq!(train.cam_id[0], vec![0, 1, 3]);
        Ok(())
    }
}

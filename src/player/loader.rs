use std::{io::BufReader, path::Path};

use tracing::{info, warn};

use super::{
    error::MotionError,
    motion::{MotionMetadata, MotionSequence},
    npy::{self, NpyArray},
    topology::JOINT_COUNT,
};

/// Generation results as written by the motion model: the motion plus the prompts that
/// produced it.
#[derive(Debug, serde::Deserialize)]
struct ResultsFile {
    motion: MotionArray,
    #[serde(default)]
    text: Vec<String>,
    #[serde(default)]
    lengths: Vec<usize>,
}

#[derive(Debug, serde::Deserialize)]
#[serde(untagged)]
enum MotionArray {
    /// `(batch, joint, axis, frame)`
    Batched(Vec<Vec<Vec<Vec<f32>>>>),
    /// `(joint, axis, frame)`
    Single(Vec<Vec<Vec<f32>>>),
}

/// Load a motion from a `.npy` array or a `.json` results file.
pub fn load_motion(path: impl AsRef<Path>) -> Result<MotionSequence, MotionError> {
    let path = path.as_ref();
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);

    let file = BufReader::new(std::fs::File::open(path)?);
    let motion = match extension.as_deref() {
        Some("npy") => motion_from_npy(npy::read_npy(file)?)?,
        Some("json") => motion_from_results(serde_json::from_reader(file)?)?,
        _ => return Err(MotionError::UnsupportedFile(path.to_path_buf())),
    };

    info!(
        "Loaded {} frames of {} joints from {}",
        motion.frame_count(),
        JOINT_COUNT,
        path.display()
    );

    Ok(motion)
}

fn motion_from_npy(array: NpyArray) -> Result<MotionSequence, MotionError> {
    let frame_count = match array.shape.as_slice() {
        &[batch, JOINT_COUNT, 3, frames] if batch >= 1 => {
            if batch > 1 {
                warn!("Motion has {batch} batch entries, only the first is shown");
            }
            frames
        }
        &[JOINT_COUNT, 3, frames] => frames,
        _ => return Err(MotionError::Shape(array.shape)),
    };

    let len = JOINT_COUNT * 3 * frame_count;
    MotionSequence::from_joint_axis_frame(&array.values[..len], frame_count)
}

fn motion_from_results(results: ResultsFile) -> Result<MotionSequence, MotionError> {
    let joints = match results.motion {
        MotionArray::Batched(batches) => {
            if batches.len() > 1 {
                warn!(
                    "Motion has {} batch entries, only the first is shown",
                    batches.len()
                );
            }
            batches
                .into_iter()
                .next()
                .ok_or(MotionError::Shape(vec![0]))?
        }
        MotionArray::Single(joints) => joints,
    };

    let frame_count = joints
        .first()
        .and_then(|axes| axes.first())
        .map_or(0, Vec::len);

    let well_formed = joints.len() == JOINT_COUNT
        && joints.iter().all(|axes| {
            axes.len() == 3 && axes.iter().all(|frames| frames.len() == frame_count)
        });
    if !well_formed {
        return Err(MotionError::Shape(vec![
            joints.len(),
            joints.first().map_or(0, Vec::len),
            frame_count,
        ]));
    }

    let values = joints.into_iter().flatten().flatten().collect::<Vec<_>>();

    Ok(
        MotionSequence::from_joint_axis_frame(&values, frame_count)?.with_metadata(
            MotionMetadata {
                texts: results.text,
                lengths: results.lengths,
            },
        ),
    )
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::*;

    fn results_json(frame_count: usize, batched: bool) -> String {
        let joint = |j: usize| {
            let axis = |a: usize| {
                (0..frame_count)
                    .map(|f| (j * 100 + a * 10 + f) as f32)
                    .collect::<Vec<_>>()
            };
            vec![axis(0), axis(1), axis(2)]
        };
        let motion = (0..JOINT_COUNT).map(joint).collect::<Vec<_>>();
        let motion = if batched {
            serde_json::json!([motion])
        } else {
            serde_json::json!(motion)
        };

        serde_json::json!({
            "motion": motion,
            "text": ["a person walks forward", "then sits down"],
            "lengths": [frame_count],
        })
        .to_string()
    }

    #[test]
    fn results_document_with_batch_dimension() {
        let results = serde_json::from_str(&results_json(5, true)).unwrap();
        let motion = motion_from_results(results).unwrap();

        assert_eq!(motion.frame_count(), 5);
        assert_eq!(motion.frame(4).unwrap()[1], Vec3::new(104.0, 114.0, 124.0));
        assert_eq!(
            motion.metadata().texts,
            vec!["a person walks forward", "then sits down"]
        );
        assert_eq!(motion.metadata().lengths, vec![5]);
    }

    #[test]
    fn results_document_without_batch_dimension() {
        let results = serde_json::from_str(&results_json(2, false)).unwrap();
        let motion = motion_from_results(results).unwrap();
        assert_eq!(motion.frame_count(), 2);
    }

    #[test]
    fn ragged_results_are_rejected() {
        let results: ResultsFile =
            serde_json::from_str(r#"{ "motion": [[[0.0, 1.0], [0.0], [0.0, 1.0]]] }"#).unwrap();
        assert!(matches!(
            motion_from_results(results),
            Err(MotionError::Shape(_))
        ));
    }

    #[test]
    fn npy_shapes() {
        let values = vec![0.0; JOINT_COUNT * 3 * 2];

        let motion = motion_from_npy(NpyArray {
            shape: vec![1, JOINT_COUNT, 3, 2],
            values: values.clone(),
        })
        .unwrap();
        assert_eq!(motion.frame_count(), 2);

        let motion = motion_from_npy(NpyArray {
            shape: vec![JOINT_COUNT, 3, 2],
            values: values.clone(),
        })
        .unwrap();
        assert_eq!(motion.frame_count(), 2);

        assert!(matches!(
            motion_from_npy(NpyArray {
                shape: vec![1, 24, 3, 2],
                values,
            }),
            Err(MotionError::Shape(shape)) if shape == vec![1, 24, 3, 2]
        ));
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let path = std::env::temp_dir().join("skeleton-player-motion.txt");
        std::fs::write(&path, "not a motion").unwrap();
        let result = load_motion(&path);
        let _ = std::fs::remove_file(&path);

        assert!(matches!(result, Err(MotionError::UnsupportedFile(_))));
    }
}

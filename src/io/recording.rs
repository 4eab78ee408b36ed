use crate::scene::camera::CameraPose;
use chrono::Local;
use log::info;
use nalgebra::{Matrix3, Point3};
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Writes one pose block: `pos:` then the three orientation rows.
pub fn write_pose<W: Write>(out: &mut W, pose: &CameraPose) -> std::io::Result<()> {
    let p = pose.position;
    let m = pose.orientation;
    writeln!(out, "pos: {}, {}, {}", p.x, p.y, p.z)?;
    for row in 0..3 {
        writeln!(
            out,
            "orient{}: {}, {}, {}",
            row + 1,
            m[(row, 0)],
            m[(row, 1)],
            m[(row, 2)]
        )?;
    }
    writeln!(out)
}

/// Appends camera poses to a recording file.
pub struct CameraRecorder {
    path: PathBuf,
    writer: BufWriter<File>,
    count: usize,
}

impl CameraRecorder {
    /// Opens `path` for appending and stamps a session header.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| format!("Failed to open recording '{}': {}", path.display(), e))?;
        let mut writer = BufWriter::new(file);
        writeln!(writer, "# recorded {}", Local::now().format("%Y-%m-%d %H:%M:%S"))
            .map_err(|e| format!("Failed to write recording header: {}", e))?;

        info!("Recording camera poses to {}", path.display());
        Ok(Self {
            path,
            writer,
            count: 0,
        })
    }

    pub fn append(&mut self, pose: &CameraPose) -> Result<(), String> {
        write_pose(&mut self.writer, pose)
            .and_then(|_| self.writer.flush())
            .map_err(|e| format!("Failed to append to '{}': {}", self.path.display(), e))?;
        self.count += 1;
        Ok(())
    }

    /// Poses appended since this recorder was opened.
    pub fn count(&self) -> usize {
        self.count
    }
}

fn parse_triple(line_no: usize, label: &str, values: &str) -> Result<[f32; 3], String> {
    let parts: Vec<&str> = values.split(',').map(str::trim).collect();
    if parts.len() != 3 {
        return Err(format!(
            "Line {}: '{}' needs 3 values, found {}",
            line_no,
            label,
            parts.len()
        ));
    }
    let mut out = [0.0; 3];
    for (slot, text) in out.iter_mut().zip(&parts) {
        *slot = text
            .parse()
            .map_err(|e| format!("Line {}: bad number '{}': {}", line_no, text, e))?;
    }
    Ok(out)
}

#[derive(Default)]
struct PartialPose {
    position: Option<[f32; 3]>,
    rows: [Option<[f32; 3]>; 3],
}

impl PartialPose {
    fn is_empty(&self) -> bool {
        self.position.is_none() && self.rows.iter().all(Option::is_none)
    }

    fn finish(self, line_no: usize) -> Result<CameraPose, String> {
        let incomplete = || format!("Line {}: incomplete pose block", line_no);
        let p = self.position.ok_or_else(incomplete)?;
        let [r0, r1, r2] = self.rows;
        let (r0, r1, r2) = (
            r0.ok_or_else(incomplete)?,
            r1.ok_or_else(incomplete)?,
            r2.ok_or_else(incomplete)?,
        );
        #[rustfmt::skip]
        let orientation = Matrix3::new(
            r0[0], r0[1], r0[2],
            r1[0], r1[1], r1[2],
            r2[0], r2[1], r2[2],
        );
        Ok(CameraPose {
            position: Point3::from(p),
            orientation,
        })
    }
}

/// Parses the text written by [`CameraRecorder`]. Blank lines end a block,
/// `#` lines are ignored.
pub fn parse_recording(text: &str) -> Result<Vec<CameraPose>, String> {
    let mut poses = Vec::new();
    let mut current = PartialPose::default();

    for (index, raw) in text.lines().enumerate() {
        let line_no = index + 1;
        let line = raw.trim();
        if line.starts_with('#') {
            continue;
        }
        if line.is_empty() {
            if !current.is_empty() {
                poses.push(std::mem::take(&mut current).finish(line_no)?);
            }
            continue;
        }

        let (label, values) = line
            .split_once(':')
            .ok_or_else(|| format!("Line {}: expected 'label: x, y, z'", line_no))?;
        let label = label.trim();
        let triple = parse_triple(line_no, label, values)?;
        match label {
            "pos" => current.position = Some(triple),
            "orient1" => current.rows[0] = Some(triple),
            "orient2" => current.rows[1] = Some(triple),
            "orient3" => current.rows[2] = Some(triple),
            other => return Err(format!("Line {}: unknown field '{}'", line_no, other)),
        }
    }

    if !current.is_empty() {
        poses.push(current.finish(text.lines().count())?);
    }
    Ok(poses)
}

pub fn load_recording<P: AsRef<Path>>(path: P) -> Result<Vec<CameraPose>, String> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read recording '{}': {}", path.display(), e))?;
    let poses = parse_recording(&text)?;
    info!("Loaded {} camera poses from {}", poses.len(), path.display());
    Ok(poses)
}

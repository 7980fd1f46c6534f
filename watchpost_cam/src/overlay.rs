use crate::camera::CapturedFrame;
use opencv::{
    core::{Point, Rect, Scalar},
    imgproc,
    prelude::*,
};
use watchpost::error::SessionError;
use watchpost::pipeline::FrameReport;
use watchpost::session::Renderer;

// Colors are BGR.
const RED: (f64, f64, f64) = (0.0, 0.0, 255.0);
const GREEN: (f64, f64, f64) = (0.0, 255.0, 0.0);
const WHITE: (f64, f64, f64) = (255.0, 255.0, 255.0);

const STATUS_ORIGIN: (i32, i32) = (450, 50);

fn color((b, g, r): (f64, f64, f64)) -> Scalar {
    Scalar::new(b, g, r, 0.0)
}

/// Draws motion boxes, the SAFE/UNSAFE label and a timestamp onto each frame.
#[derive(Debug, Default)]
pub struct StatusOverlay;

impl StatusOverlay {
    pub fn new() -> Self {
        Self
    }

    fn draw_regions(&self, frame: &mut Mat, report: &FrameReport) -> opencv::Result<()> {
        for region in &report.regions {
            let bbox = region.bounding_box;
            let rect = Rect::new(
                bbox.x as i32,
                bbox.y as i32,
                bbox.width as i32,
                bbox.height as i32,
            );
            imgproc::rectangle(frame, rect, color(RED), 2, imgproc::LINE_8, 0)?;
        }
        Ok(())
    }

    fn draw_status(&self, frame: &mut Mat, report: &FrameReport) -> opencv::Result<()> {
        let label_color = if report.is_unsafe() { RED } else { GREEN };
        imgproc::put_text(
            frame,
            report.status.label(),
            Point::new(STATUS_ORIGIN.0, STATUS_ORIGIN.1),
            imgproc::FONT_HERSHEY_SIMPLEX,
            1.0,
            color(label_color),
            3,
            imgproc::LINE_8,
            false,
        )?;

        let timestamp = report.captured_at.format("%Y-%m-%d %H:%M:%S").to_string();
        let bottom = frame.rows() - 10;
        imgproc::put_text(
            frame,
            &timestamp,
            Point::new(10, bottom),
            imgproc::FONT_HERSHEY_SIMPLEX,
            0.5,
            color(WHITE),
            1,
            imgproc::LINE_8,
            false,
        )?;
        Ok(())
    }
}

impl Renderer<CapturedFrame> for StatusOverlay {
    fn draw(&mut self, frame: &mut CapturedFrame, report: &FrameReport) -> Result<(), SessionError> {
        let mat = frame.mat_mut();
        self.draw_regions(mat, report)
            .and_then(|_| self.draw_status(mat, report))
            .map_err(|e| SessionError::Render(e.to_string()))
    }
}

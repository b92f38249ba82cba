//! # Simulated Vehicle Link
//!
//! The SimVehicleLink is a development stand-in for a real vehicle
//! transport. It synthesises video frames at a fixed cadence, tracks the
//! airborne and manual-control state a real quadrotor would hold, and
//! answers mode commands idempotently (a takeoff while airborne is
//! acknowledged, not an error). It is to be used for testing and
//! development of the control pipeline rather than actual flying.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::time::{Duration, Instant};

use image::{DynamicImage, Rgb, RgbImage};
use log::{debug, info, trace};

use vehicle_if::{
    cmds::{MoveCommand, VehicleResponse},
    frame::Frame,
    link::{LinkError, VehicleLink},
};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Size of the synthetic frames produced by the link.
const SIM_FRAME_SIZE: (u32, u32) = (320, 240);

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Simulated vehicle link.
pub struct SimVehicleLink {
    addr: String,

    /// True once the vehicle has taken off
    airborne: bool,

    /// True while manual control is enabled
    manual_ctrl: bool,

    frame_period: Duration,
    last_frame: Option<Instant>,
    frame_count: u64,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl SimVehicleLink {
    /// "Connect" to the simulated vehicle.
    ///
    /// The signature matches what a real transport needs: the address is
    /// kept for logging and the call is fallible so the executable's fatal
    /// initialisation path is exercised the same way it would be with real
    /// hardware.
    pub fn new(addr: &str, frame_period_s: f64) -> Result<Self, LinkError> {
        info!("SimVehicleLink connected to {}", addr);

        Ok(Self {
            addr: String::from(addr),
            airborne: false,
            manual_ctrl: false,
            frame_period: Duration::from_secs_f64(frame_period_s),
            last_frame: None,
            frame_count: 0,
        })
    }

    /// Build the next synthetic frame: a moving gradient with a bright spot
    /// orbiting the centre, so the centroid detector has something to
    /// track.
    fn synthesise_frame(&mut self) -> Frame {
        let (w, h) = SIM_FRAME_SIZE;
        let mut img = RgbImage::from_pixel(w, h, Rgb([32u8, 32u8, 48u8]));

        // Orbit period of ~100 frames
        let phase = (self.frame_count % 100) as f64 / 100.0 * std::f64::consts::TAU;
        let spot_x = (w as f64 / 2.0 + phase.cos() * w as f64 / 4.0) as u32;
        let spot_y = (h as f64 / 2.0 + phase.sin() * h as f64 / 4.0) as u32;

        for dy in 0..8u32 {
            for dx in 0..8u32 {
                let x = (spot_x + dx).min(w - 1);
                let y = (spot_y + dy).min(h - 1);
                img.put_pixel(x, y, Rgb([255u8, 255u8, 255u8]));
            }
        }

        self.frame_count += 1;
        trace!("Synthesised frame {}", self.frame_count);

        Frame::new(DynamicImage::ImageRgb8(img))
    }
}

impl VehicleLink for SimVehicleLink {
    fn takeoff(&mut self, _wait_for_ack: bool) -> Result<VehicleResponse, LinkError> {
        if self.airborne {
            debug!("Takeoff requested while airborne, no-op");
        } else {
            info!("Sim vehicle at {} taking off", self.addr);
            self.airborne = true;
        }
        Ok(VehicleResponse::Ok)
    }

    fn land(&mut self, _wait_for_ack: bool) -> Result<VehicleResponse, LinkError> {
        if self.airborne {
            info!("Sim vehicle at {} landing", self.addr);
            self.airborne = false;
        } else {
            debug!("Land requested while on the ground, no-op");
        }
        Ok(VehicleResponse::Ok)
    }

    fn enable_manual_control(
        &mut self,
        _wait_for_ack: bool,
    ) -> Result<VehicleResponse, LinkError> {
        self.manual_ctrl = true;
        info!("Sim vehicle manual control enabled");
        Ok(VehicleResponse::Ok)
    }

    fn disable_manual_control(
        &mut self,
        _wait_for_ack: bool,
    ) -> Result<VehicleResponse, LinkError> {
        self.manual_ctrl = false;
        info!("Sim vehicle manual control disabled");
        Ok(VehicleResponse::Ok)
    }

    fn move_cmd(
        &mut self,
        cmd: &MoveCommand,
        _wait_for_ack: bool,
    ) -> Result<VehicleResponse, LinkError> {
        if !self.airborne {
            // A real MSDK rejects movement on the ground; the loop logs and
            // carries on
            return Ok(VehicleResponse::Rejected(String::from(
                "vehicle is not airborne",
            )));
        }

        trace!(
            "Sim move: ({:.4}, {:.4}, {:.4}, {:.4})",
            cmd.yaw_rate,
            cmd.vertical,
            cmd.lateral,
            cmd.forward
        );
        Ok(VehicleResponse::Ok)
    }

    fn get_frame(&mut self) -> Result<Option<Frame>, LinkError> {
        // Non-blocking poll: a frame is only available once per period
        match self.last_frame {
            Some(t) if t.elapsed() < self.frame_period => Ok(None),
            _ => {
                self.last_frame = Some(Instant::now());
                Ok(Some(self.synthesise_frame()))
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_mode_commands_idempotent() {
        let mut link = SimVehicleLink::new("sim", 0.01).unwrap();

        assert!(matches!(link.takeoff(true), Ok(VehicleResponse::Ok)));
        // Second takeoff is a no-op, not an error
        assert!(matches!(link.takeoff(true), Ok(VehicleResponse::Ok)));
        assert!(link.airborne);

        assert!(matches!(link.land(true), Ok(VehicleResponse::Ok)));
        assert!(matches!(link.land(true), Ok(VehicleResponse::Ok)));
        assert!(!link.airborne);
    }

    #[test]
    fn test_move_rejected_on_ground() {
        let mut link = SimVehicleLink::new("sim", 0.01).unwrap();

        let resp = link.move_cmd(&MoveCommand::default(), true).unwrap();
        assert!(matches!(resp, VehicleResponse::Rejected(_)));

        link.takeoff(true).unwrap();
        let resp = link.move_cmd(&MoveCommand::default(), true).unwrap();
        assert!(matches!(resp, VehicleResponse::Ok));
    }

    #[test]
    fn test_frame_cadence() {
        let mut link = SimVehicleLink::new("sim", 10.0).unwrap();

        // First poll yields a frame, the next (well within the period) does
        // not
        assert!(link.get_frame().unwrap().is_some());
        assert!(link.get_frame().unwrap().is_none());
    }
}

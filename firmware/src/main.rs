#![no_std]
#![no_main]

mod board;
mod encoder_pins;
mod esc;
mod hbridge;
mod imu;
mod logging;
mod steering_pot;

use defmt_rtt as _;
use panic_probe as _;

use microcar::calibration::EncoderCalibration;
use microcar::sync::Latest;
use microcar::{DriveCommand, EncoderDecoder, InertialSample};

const NAME: &str = env!("CARGO_PKG_NAME");
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Written from EXTI15_10, read by the control task.
static ENCODER: EncoderDecoder = EncoderDecoder::new(EncoderCalibration::DEFAULT);

/// Whatever link carries drive commands publishes here; the control task
/// holds the car still until something does.
pub static COMMANDS: Latest<DriveCommand> = Latest::new();

static INERTIAL: Latest<InertialSample> = Latest::new();

/// Log a pose line every this many ticks (once a second at 50 Hz).
const POSE_LOG_EVERY: u32 = 50;

#[rtic::app(device = stm32f4xx_hal::pac, dispatchers = [USART1, USART3])]
mod app {
    use super::*;

    use board::{Board, DriveEsc, ImuBus, MonoClock, SteeringBridge};
    use encoder_pins::EncoderPins;
    use imu::Lsm6dsox;
    use steering_pot::SteeringPot;

    use microcar::hal::Clock;
    use microcar::sensors::imu::ImuDriver;
    use microcar::{Calibration, ControlLoop};

    use fugit::ExtU64;
    use log::{error, info, warn};
    use rtic_monotonics::{stm32::Tim2, Monotonic};

    type CarLoop = ControlLoop<'static, SteeringPot, DriveEsc, SteeringBridge>;

    #[shared]
    struct Shared {}

    #[local]
    struct Local {
        edges: EncoderPins,
        control: CarLoop,
        imu: ImuDriver<Lsm6dsox<ImuBus>>,
    }

    #[init]
    fn init(ctx: init::Context) -> (Shared, Local) {
        logging::init(logging::Level::Info);
        info!("{} v{}", NAME, VERSION);

        let calibration = match Calibration::new().validate() {
            Ok(c) => c,
            Err(e) => panic!("calibration rejected: {}", e),
        };

        let mut board = Board::init(ctx.device, ctx.core);

        let token = rtic_monotonics::create_stm32_tim2_monotonic_token!();
        Tim2::start(board.clocks.timclk1().to_Hz(), token);

        ENCODER.prime(board.encoder.read());

        let mut lsm = Lsm6dsox::new(board.imu_bus);
        let imu_ok = match lsm.setup(&mut board.delay) {
            Ok(()) => true,
            Err(e) => {
                error!("lsm6dsox setup failed: {:?}", e);
                false
            }
        };
        let imu = ImuDriver::new(lsm);

        let control = ControlLoop::new(
            calibration,
            &ENCODER,
            &COMMANDS,
            &INERTIAL,
            board.steering_pot,
            board.esc,
            board.steering,
        );

        control::spawn().ok();
        if imu_ok {
            imu_poll::spawn().ok();
        } else {
            warn!("running without heading rate");
        }

        (
            Shared {},
            Local {
                edges: board.encoder,
                control,
                imu,
            },
        )
    }

    #[task(binds = EXTI15_10, priority = 3, local = [edges])]
    fn encoder_edge(ctx: encoder_edge::Context) {
        ENCODER.service(ctx.local.edges, &MonoClock);
    }

    #[task(priority = 2, local = [imu])]
    async fn imu_poll(ctx: imu_poll::Context) {
        let imu = ctx.local.imu;
        loop {
            match imu.update(MonoClock.now()) {
                Ok(Some(sample)) => INERTIAL.publish(sample),
                Ok(None) => {}
                Err(e) => warn!("imu read failed: {:?}", e),
            }
            Tim2::delay(5_u64.millis()).await;
        }
    }

    #[task(priority = 1, local = [control])]
    async fn control(ctx: control::Context) {
        let control = ctx.local.control;
        let period = (control.period().ticks() as u64).micros();
        let mut next = Tim2::now();
        let mut ticks: u32 = 0;

        loop {
            let out = control.tick(MonoClock.now());

            ticks = ticks.wrapping_add(1);
            if ticks % POSE_LOG_EVERY == 0 {
                info!(
                    "pose x={} y={} th={} v={} dist={}",
                    out.pose.x, out.pose.y, out.pose.theta, out.pose.linear_velocity, out.distance
                );
            }

            next += period;
            Tim2::delay_until(next).await;
        }
    }
}

//! Pin and peripheral assignment for the car's STM32F407 board.

use crate::encoder_pins::EncoderPins;
use crate::esc::Esc;
use crate::hbridge::HBridge;
use crate::steering_pot::SteeringPot;

use microcar::controls::motor_math::ESC_FRAME_HZ;
use microcar::hal::Clock;
use microcar::time::Instant;

use rtic_monotonics::{stm32::Tim2, Monotonic};
use stm32f4xx_hal::{
    adc::{config::AdcConfig, Adc},
    gpio::Edge,
    i2c::I2c,
    pac::{CorePeripherals, Peripherals, I2C1, TIM3, TIM4},
    prelude::*,
    rcc::Clocks,
    timer::{SysDelay, Timer3, Timer4},
};

pub type DriveEsc = Esc<TIM3, 0>;
pub type SteeringBridge = HBridge<TIM4, TIM4, 0, 1>;
pub type ImuBus = I2c<I2C1>;

/// Reads the RTIC TIM2 monotonic. The 64-bit microsecond count is truncated
/// to the 32-bit instants the core works with, which wrap every ~71 minutes.
#[derive(Debug, Clone, Copy, Default)]
pub struct MonoClock;

impl Clock for MonoClock {
    fn now(&self) -> Instant {
        Instant::from_ticks(Tim2::now().ticks() as u32)
    }
}

pub struct Board {
    pub clocks: Clocks,
    pub delay: SysDelay,
    pub encoder: EncoderPins,
    pub esc: DriveEsc,
    pub steering: SteeringBridge,
    pub steering_pot: SteeringPot,
    pub imu_bus: ImuBus,
}

impl Board {
    pub fn init(mut pac: Peripherals, core: CorePeripherals) -> Self {
        let mut syscfg = pac.SYSCFG.constrain();

        let rcc = pac.RCC.constrain();
        let clocks = rcc.cfgr.use_hse(8.MHz()).sysclk(168.MHz()).freeze();
        let delay = core.SYST.delay(&clocks);

        let gpiob = pac.GPIOB.split();
        let gpioc = pac.GPIOC.split();

        // Wheel encoder, both channels on EXTI15_10
        let mut enc_a = gpiob.pb12.into_pull_up_input();
        let mut enc_b = gpiob.pb13.into_pull_up_input();
        enc_a.make_interrupt_source(&mut syscfg);
        enc_a.trigger_on_edge(&mut pac.EXTI, Edge::RisingFalling);
        enc_a.enable_interrupt(&mut pac.EXTI);
        enc_b.make_interrupt_source(&mut syscfg);
        enc_b.trigger_on_edge(&mut pac.EXTI, Edge::RisingFalling);
        enc_b.enable_interrupt(&mut pac.EXTI);
        let encoder = EncoderPins::new(enc_a, enc_b);

        // Drive ESC, servo-style frame
        let tim3 = Timer3::new(pac.TIM3, &clocks);
        let tim3_pins = (
            gpioc.pc6.into_alternate(),
            gpioc.pc7.into_alternate(),
            gpioc.pc8.into_alternate(),
            gpioc.pc9.into_alternate(),
        );
        let pwm3 = tim3.pwm_hz(tim3_pins, ESC_FRAME_HZ.Hz());
        let (esc_signal, _, _, _) = pwm3.split();
        let esc = Esc::new(esc_signal);

        // Steering H-bridge
        let tim4 = Timer4::new(pac.TIM4, &clocks);
        let tim4_pins = (gpiob.pb6.into_alternate(), gpiob.pb7.into_alternate());
        let pwm4 = tim4.pwm_hz(tim4_pins, 10.kHz());
        let (steer_a, steer_b) = pwm4.split();
        let steering = HBridge::new(steer_a, steer_b);

        let adc = Adc::adc1(pac.ADC1, true, AdcConfig::default());
        let steering_pot = SteeringPot::new(adc, gpioc.pc1.into_analog());

        let imu_bus = I2c::new(pac.I2C1, (gpiob.pb8, gpiob.pb9), 400.kHz(), &clocks);

        Self {
            clocks,
            delay,
            encoder,
            esc,
            steering,
            steering_pot,
            imu_bus,
        }
    }
}

#![no_std]
#![no_main]
#![deny(
    clippy::mem_forget,
    reason = "mem::forget is generally not safe to do with esp_hal types, especially those     holding buffers for the duration of a data transfer."
)]

use cardputer_keyboard_async::config::{Timings, COLUMN_COUNT, I2C_FREQUENCY_KHZ};
use cardputer_keyboard_async::keyboard::{Keyboard, KeyboardStatus};
use cardputer_keyboard_async::matrix::MatrixScanner;
use embassy_executor::Spawner;
use embassy_time::{Delay, Duration, Timer};
use esp_hal::i2c::master::I2c;
use esp_hal::{
    clock::CpuClock,
    gpio::{Input, InputConfig, Level, Output, OutputConfig, Pull},
    time::Rate,
    timer::systimer::SystemTimer,
};
use esp_println::println;
use log::{error, info};

type CardputerKeyboard = Keyboard<
    I2c<'static, esp_hal::Async>,
    esp_hal::i2c::master::Error,
    Output<'static>,
    Input<'static>,
    Delay,
    COLUMN_COUNT,
>;

#[panic_handler]
fn panic(info: &core::panic::PanicInfo) -> ! {
    println!("{}", info);
    loop {}
}

// This creates a default app-descriptor required by the esp-idf bootloader.
// For more information see: <https://docs.espressif.com/projects/esp-idf/en/stable/esp32/api-reference/system/app_image_format.html#application-description>
esp_bootloader_esp_idf::esp_app_desc!();

/// The main entry point of the application.
#[esp_hal_embassy::main]
async fn main(spawner: Spawner) {
    esp_println::logger::init_logger(log::LevelFilter::Debug);

    let config = esp_hal::Config::default().with_cpu_clock(CpuClock::max());
    let peripherals = esp_hal::init(config);

    let timer0 = SystemTimer::new(peripherals.SYSTIMER);
    esp_hal_embassy::init(timer0.alarm0);

    // Give the serial monitor time to attach.
    Timer::after(Duration::from_millis(300)).await;
    info!("Keyboard Scan Test");

    // On the ADV, G8/G9 carry the TCA8418 bus. On V1.1 the same pins, plus G11,
    // select the matrix row. The I2C driver has to be `'static` to move into the
    // keyboard task, so it cannot borrow the pins; it owns them instead and the
    // legacy path works on clones.
    // SAFETY: the clones are only touched inside the `build_matrix` closure, after
    // its `drop(i2c)` has released G8/G9. On the ADV path the closure never runs.
    let (row_a0, row_a1) = unsafe {
        (
            peripherals.GPIO8.clone_unchecked(),
            peripherals.GPIO9.clone_unchecked(),
        )
    };
    let row_a2 = peripherals.GPIO11;
    let column_pins = (
        peripherals.GPIO3,
        peripherals.GPIO4,
        peripherals.GPIO5,
        peripherals.GPIO6,
        peripherals.GPIO7,
        peripherals.GPIO13,
        peripherals.GPIO15,
    );

    let config =
        esp_hal::i2c::master::Config::default().with_frequency(Rate::from_khz(I2C_FREQUENCY_KHZ));
    let keyboard_i2c = I2c::new(peripherals.I2C0, config)
        .unwrap()
        .with_sda(peripherals.GPIO8)
        .with_scl(peripherals.GPIO9)
        .into_async();

    let timings = Timings::default();
    let keyboard: CardputerKeyboard =
        Keyboard::start(keyboard_i2c, Delay, timings, move |i2c, delay| {
            drop(i2c);
            // Columns stay untouched on the ADV; only V1.1 pulls them up.
            let column_config = InputConfig::default().with_pull(Pull::Up);
            let (c0, c1, c2, c3, c4, c5, c6) = column_pins;
            let cols = [
                Input::new(c0, column_config),
                Input::new(c1, column_config),
                Input::new(c2, column_config),
                Input::new(c3, column_config),
                Input::new(c4, column_config),
                Input::new(c5, column_config),
                Input::new(c6, column_config),
            ];
            let rows = [
                Output::new(row_a0, Level::Low, OutputConfig::default()),
                Output::new(row_a1, Level::Low, OutputConfig::default()),
                Output::new(row_a2, Level::Low, OutputConfig::default()),
            ];
            MatrixScanner::new(rows, cols, delay, timings)
        })
        .await;

    if keyboard.status() == KeyboardStatus::Halted {
        error!("Failed to initialize keyboard.");
    }

    spawner.spawn(read_keys(keyboard)).unwrap();

    loop {
        Timer::after(Duration::from_secs(1)).await;
    }
}

/// A task that continuously polls the keyboard and logs every key event.
#[embassy_executor::task]
async fn read_keys(mut keyboard: CardputerKeyboard) {
    keyboard.run().await;
}

//! Prints the port list whenever it changes.
//!
//! With `--features midi` this watches MIDI inputs, with `--features hid` HID
//! devices; otherwise it drives a virtual subsystem that plugs and unplugs a few fake ports.

use portprobe::{DevicePortProbe, ProbeConfig};
use std::time::{Duration, Instant};
use tracing::info;

fn main() {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_thread_names(true)
        .init();

    let config = std::env::args()
        .nth(1)
        .map(|path| ProbeConfig::load(&path).expect("load probe config"))
        .unwrap_or_default();

    #[cfg(feature = "midi")]
    let mut probe =
        DevicePortProbe::with_subsystem(&portprobe::backends::MidiSubsystem::default(), config);

    #[cfg(all(feature = "hid", not(feature = "midi")))]
    let mut probe = DevicePortProbe::with_subsystem(&portprobe::backends::HidSubsystem, config);

    #[cfg(not(any(feature = "midi", feature = "hid")))]
    let devices = portprobe::VirtualSubsystem::new(["SynthA", "ControllerB"]);
    #[cfg(not(any(feature = "midi", feature = "hid")))]
    let mut probe = DevicePortProbe::with_subsystem(&devices, config);

    let started = Instant::now();
    let mut last = None;
    while started.elapsed() < Duration::from_secs(10) {
        probe.port_count();
        let snap = probe.snapshot();
        if last.as_ref() != Some(&snap) {
            println!("{}", serde_json::to_string(&*snap).expect("serialize snapshot"));
            last = Some(snap);
        }

        #[cfg(not(any(feature = "midi", feature = "hid")))]
        match started.elapsed().as_secs() {
            3 if !devices.ports().iter().any(|p| p == "Pads") => devices.plug("Pads"),
            6 => {
                devices.unplug("SynthA");
            }
            _ => {}
        }

        // ~60 fps host loop
        std::thread::sleep(Duration::from_millis(16));
    }

    probe.close();
    info!("done");
}

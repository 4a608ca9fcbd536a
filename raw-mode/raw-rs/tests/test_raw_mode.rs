use rand::{rngs::StdRng, Rng, SeedableRng};
use raw_rs::{
    serdes::{deserialize_frame_cobs, serialize_frame_cobs, FRAME_BUFFER_SIZE},
    RawFrame, RawMessage, RawMode, RawPayload,
};
use shared::{
    raw_hal::{
        ButtonTiming, ImuAxis, RawConfig, RawSample, SourceId, NUM_BUTTONS, NUM_IMU,
        NUM_TONEHOLES, RAW_MAX_VALUE,
    },
    raw_mock::RawDriverMock,
};

const TICK_MS: u64 = 5;

fn config(report_budget: u8) -> RawConfig {
    RawConfig::new(
        report_budget,
        ButtonTiming {
            debounce_ms: 10,
            long_press_ms: 200,
        },
    )
}

fn fixture_raw_mode(report_budget: u8) -> RawMode {
    RawMode::new(config(report_budget)).unwrap()
}

fn random_samples(seed: u64, count: usize) -> Vec<RawSample> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut sample = RawSample::default();
    let mut samples = Vec::with_capacity(count);

    for _ in 0..count {
        sample.pressure = rng.gen_range(-40_000..40_000);
        for hole in sample.toneholes.iter_mut() {
            if rng.gen_bool(0.2) {
                *hole = rng.gen();
            }
        }
        for button in sample.buttons.iter_mut() {
            if rng.gen_bool(0.05) {
                *button = !*button;
            }
        }
        for axis in sample.imu.iter_mut() {
            *axis = rng.gen_range(-4000.0..4000.0);
        }

        samples.push(sample);
    }

    samples
}

fn run_samples(raw_mode: &mut RawMode, samples: &[RawSample]) -> Vec<RawMessage> {
    let mut messages = Vec::new();

    for (tick, sample) in samples.iter().enumerate() {
        let frame = raw_mode.update(tick as u64 * TICK_MS, sample);
        messages.extend(frame.messages().unwrap());
    }

    messages
}

fn button_messages(messages: &[RawMessage], button: usize) -> Vec<shared::raw_hal::ButtonStatus> {
    let source = SourceId::button(button).unwrap();

    messages
        .iter()
        .filter(|message| message.source == source)
        .filter_map(|message| match message.payload {
            RawPayload::Button(status) => Some(status),
            RawPayload::Value(_) => None,
        })
        .collect()
}

#[test]
fn identical_inputs_give_identical_outputs() {
    let samples = random_samples(0xC0FFEE, 2000);

    for budget in [1, 3, 19] {
        let first = run_samples(&mut fixture_raw_mode(budget), &samples);
        let second = run_samples(&mut fixture_raw_mode(budget), &samples);

        assert!(!first.is_empty());
        assert_eq!(first, second);
    }
}

#[test]
fn no_change_emits_nothing() {
    let mut raw_mode = fixture_raw_mode(4);
    let mut driver = RawDriverMock::new(TICK_MS);
    driver.set_pressure(8192);
    driver.set_tonehole(2, 2000);
    driver.set_imu(ImuAxis::Roll, 720.0);

    // Let everything settle
    let mut reported = 0;
    for _ in 0..10 {
        reported += raw_mode.update_from_driver(&mut driver).len();
    }
    assert_eq!(reported, 3);

    for _ in 0..100 {
        let frame = raw_mode.update_from_driver(&mut driver);
        assert!(frame.is_empty());
        assert_eq!(frame.mask, None);
    }
}

#[test]
fn button_beats_maximal_continuous_delta() {
    let mut raw_mode = fixture_raw_mode(1);
    let mut driver = RawDriverMock::new(TICK_MS);
    raw_mode.update_from_driver(&mut driver);

    driver.set_pressure(i32::MAX);
    driver.set_imu(ImuAxis::AccelX, f32::MAX);
    driver.set_button(1, true);

    // Pressure and IMU change at once, the button becomes stable two ticks later
    let frame = raw_mode.update_from_driver(&mut driver);
    assert_eq!(frame.messages().unwrap()[0].source, SourceId::PRESSURE);
    let frame = raw_mode.update_from_driver(&mut driver);
    assert_eq!(frame.messages().unwrap()[0].source, SourceId::imu(ImuAxis::AccelX));

    driver.set_pressure(i32::MIN);
    driver.set_imu(ImuAxis::AccelX, f32::MIN);
    let frame = raw_mode.update_from_driver(&mut driver);
    let messages = frame.messages().unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].source, SourceId::button(1).unwrap());
}

#[test]
fn equal_deltas_report_lower_id_first() {
    let mut raw_mode = fixture_raw_mode(1);
    let mut driver = RawDriverMock::new(TICK_MS);
    driver.set_tonehole(6, 512 * 4);
    driver.set_imu(ImuAxis::Pitch, 180.0 * 4.0);

    let first = raw_mode.update_from_driver(&mut driver).messages().unwrap();
    let second = raw_mode.update_from_driver(&mut driver).messages().unwrap();

    assert_eq!(first[0].source, SourceId::tonehole(6).unwrap());
    assert_eq!(second[0].source, SourceId::imu(ImuAxis::Pitch));
    assert_eq!(second[0].payload, RawPayload::Value(4));
}

#[test]
fn one_pulse_per_press_and_release() {
    let mut raw_mode = fixture_raw_mode(2);
    let mut driver = RawDriverMock::new(TICK_MS);
    let mut messages = Vec::new();

    // Three presses: short, long (held past 200 ms), short with contact bounce
    let script: [(bool, usize); 8] = [
        (true, 10),
        (false, 10),
        (true, 80),
        (false, 10),
        (true, 1),
        (false, 1),
        (true, 10),
        (false, 10),
    ];

    for (level, ticks) in script {
        driver.set_button(0, level);
        for _ in 0..ticks {
            messages.extend(raw_mode.update_from_driver(&mut driver).messages().unwrap());
        }
    }

    let statuses = button_messages(&messages, 0);
    let ons = statuses.iter().filter(|status| status.toggle_on).count();
    let offs = statuses.iter().filter(|status| status.toggle_off).count();
    let longs = statuses.iter().filter(|status| status.long_press).count();

    assert_eq!(ons, 3);
    assert_eq!(offs, 3);
    assert_eq!(longs, 1);
    assert!(statuses.iter().all(|status| status.edge_count() > 0));
}

#[test]
fn busy_buttons_lose_no_presses() {
    let mut raw_mode = RawMode::new(RawConfig::new(
        1,
        ButtonTiming {
            debounce_ms: 0,
            long_press_ms: 200,
        },
    ))
    .unwrap();
    let mut driver = RawDriverMock::new(TICK_MS);
    let mut messages = Vec::new();

    // Every button goes through press, release, press, long hold, release
    let script: [(bool, usize); 5] = [(true, 1), (false, 1), (true, 60), (false, 1), (false, 20)];

    for (level, ticks) in script {
        for button in 0..NUM_BUTTONS {
            driver.set_button(button, level);
        }
        for _ in 0..ticks {
            messages.extend(raw_mode.update_from_driver(&mut driver).messages().unwrap());
        }
    }

    for button in 0..NUM_BUTTONS {
        let edges: Vec<_> = button_messages(&messages, button)
            .iter()
            .map(|status| (status.toggle_on, status.toggle_off, status.long_press))
            .collect();

        assert_eq!(
            edges,
            [
                (true, false, false),
                (false, true, false),
                (true, false, false),
                (false, false, true),
                (false, true, false),
            ]
        );
    }
}

#[test]
fn random_button_edges_alternate() {
    let samples = random_samples(7, 5000);
    let messages = run_samples(&mut fixture_raw_mode(1), &samples);

    for button in 0..NUM_BUTTONS {
        let mut pressed = false;
        let mut long_in_hold = false;

        for status in button_messages(&messages, button) {
            if status.toggle_on {
                assert!(!pressed || status.toggle_off);
                pressed = true;
                long_in_hold = false;
            }
            if status.long_press {
                assert!(!long_in_hold, "long press repeated within one hold");
                long_in_hold = true;
            }
            if status.toggle_off {
                pressed = status.toggle_on && status.pressed;
            }
            assert_eq!(pressed, status.pressed);
        }
    }
}

#[test]
fn normalized_values_stay_in_range() {
    let samples = random_samples(99, 500);
    let mut extreme = RawSample::default();
    extreme.pressure = i32::MIN;
    extreme.toneholes = [u16::MAX; NUM_TONEHOLES];
    extreme.imu = [f32::MAX; NUM_IMU];

    let mut raw_mode = fixture_raw_mode(19);
    let mut messages = run_samples(&mut raw_mode, &samples);
    messages.extend(raw_mode.update(10_000, &extreme).messages().unwrap());

    for message in messages {
        if let RawPayload::Value(value) = message.payload {
            assert!((value as i32).abs() < RAW_MAX_VALUE);
        }
    }
}

#[test]
fn frames_survive_cobs_transport() {
    let samples = random_samples(3, 300);
    let mut raw_mode = fixture_raw_mode(5);
    let mut buffer = [0_u8; FRAME_BUFFER_SIZE];

    for (tick, sample) in samples.iter().enumerate() {
        let frame = raw_mode.update(tick as u64 * TICK_MS, sample);
        let size = serialize_frame_cobs(&frame, &mut buffer).unwrap();
        let recv_frame: RawFrame = deserialize_frame_cobs(&mut buffer[..size]).unwrap();

        assert_eq!(recv_frame, frame);
        if let Some(mask) = recv_frame.mask {
            assert_eq!(mask.count() as usize, recv_frame.len());
            for message in recv_frame.messages().unwrap() {
                assert!(mask.contains(message.source));
            }
        }
    }
}

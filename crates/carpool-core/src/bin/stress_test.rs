//! Long-running concurrency stress test for the booking engine.
//!
//! Every cycle publishes a trip, lets a crowd of riders enroll concurrently
//! (each one twice), then races several start and cancel calls against each
//! other. After every cycle the seat accounting and the start/cancel outcome
//! are checked against what the successful calls imply.
//!
//! Usage:
//!   cargo run --bin stress_test -- [--cycles N] [--riders N]

use carpool_core::{BookingEngine, ErrorKind, ManualClock};
use carpool_schema::{BookingPolicy, TripRequest, UserProfile};
use chrono::Duration as TimeDelta;
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::{Duration, Instant};

const OWNER: &str = "stress-owner";

struct Timings {
    enroll: Duration,
    race: Duration,
}

#[derive(Default)]
struct Outcome {
    started: usize,
    cancelled: usize,
}

fn arg_value(args: &[String], flag: &str, default: usize) -> usize {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

fn enroll_crowd(engine: &Arc<BookingEngine>, trip_id: &str, riders: usize) -> (usize, usize) {
    let barrier = Arc::new(Barrier::new(riders * 2));
    let handles: Vec<_> = (0..riders * 2)
        .map(|i| {
            let e = Arc::clone(engine);
            let b = Arc::clone(&barrier);
            let trip_id = trip_id.to_owned();
            thread::spawn(move || {
                b.wait();
                e.enroll_passenger(&trip_id, &format!("rider-{}", i % riders))
                    .map_err(|err| err.kind())
            })
        })
        .collect();

    let mut accepted = 0;
    let mut conflicts = 0;
    for h in handles {
        match h.join() {
            Ok(Ok(_)) => accepted += 1,
            Ok(Err(ErrorKind::Conflict)) => conflicts += 1,
            Ok(Err(kind)) => eprintln!("  unexpected enroll error: {kind}"),
            Err(_) => eprintln!("  enroll thread panicked"),
        }
    }
    (accepted, conflicts)
}

fn race_start_and_cancel(engine: &Arc<BookingEngine>, trip_id: &str) -> Outcome {
    let contenders = 8;
    let barrier = Arc::new(Barrier::new(contenders));
    let handles: Vec<_> = (0..contenders)
        .map(|i| {
            let e = Arc::clone(engine);
            let b = Arc::clone(&barrier);
            let trip_id = trip_id.to_owned();
            thread::spawn(move || {
                b.wait();
                if i % 2 == 0 {
                    (true, e.start_trip(&trip_id, OWNER).map(|_| ()))
                } else {
                    (false, e.cancel_trip(&trip_id))
                }
            })
        })
        .collect();

    let mut outcome = Outcome::default();
    for h in handles {
        match h.join() {
            Ok((true, Ok(()))) => outcome.started += 1,
            Ok((false, Ok(()))) => outcome.cancelled += 1,
            Ok((_, Err(_))) => {}
            Err(_) => eprintln!("  race thread panicked"),
        }
    }
    outcome
}

fn run_cycle(
    engine: &Arc<BookingEngine>,
    cycle: usize,
    riders: usize,
    timings: &mut Timings,
) -> Result<(), String> {
    let trip_id = format!("trip-{cycle}");
    let seats = (riders / 2) as i32;
    engine
        .create_trip(
            &trip_id,
            TripRequest {
                car_owner_id: OWNER.into(),
                pickup_location: "depot".to_owned(),
                alt_pickup_location: None,
                start_time: engine.now() + TimeDelta::hours(1),
                destination: "terminal".to_owned(),
                total_seats: seats,
            },
        )
        .map_err(|e| format!("cycle {cycle}: CREATE FAILED: {e}"))?;

    let t0 = Instant::now();
    let (accepted, conflicts) = enroll_crowd(engine, &trip_id, riders);
    timings.enroll += t0.elapsed();
    if accepted != riders || conflicts != riders {
        return Err(format!(
            "cycle {cycle}: ENROLL MISMATCH: {accepted} accepted, {conflicts} conflicts, expected {riders} each"
        ));
    }

    let trip = engine
        .get_trip(&trip_id)
        .map_err(|e| format!("cycle {cycle}: READ FAILED: {e}"))?;
    let expected_seats = (i64::from(seats) - riders as i64).max(0) as u32;
    if trip.enrolled_passengers().len() != riders || trip.available_seats() != expected_seats {
        return Err(format!(
            "cycle {cycle}: SEAT DRIFT: {} passengers, {} available",
            trip.enrolled_passengers().len(),
            trip.available_seats()
        ));
    }

    let t0 = Instant::now();
    let outcome = race_start_and_cancel(engine, &trip_id);
    timings.race += t0.elapsed();
    let exists = engine.get_trip(&trip_id).is_ok();
    match (outcome.started, outcome.cancelled, exists) {
        (1, 0, true) | (0, 1, false) => Ok(()),
        (started, cancelled, exists) => Err(format!(
            "cycle {cycle}: RACE VIOLATION: {started} starts, {cancelled} cancels, exists={exists}"
        )),
    }
}

fn main() {
    let args: Vec<String> = std::env::args().collect();
    let cycles = arg_value(&args, "--cycles", 500);
    let riders = arg_value(&args, "--riders", 8).max(1);

    println!("Carpool stress test: {cycles} cycles, {riders} riders per trip");
    println!("============================================");

    let clock = Arc::new(ManualClock::default());
    let engine = Arc::new(BookingEngine::with_clock(BookingPolicy::default(), clock));
    let owner = UserProfile {
        is_car_owner: true,
        driver_license: Some("STRESS-L".to_owned()),
        car_plate_number: Some("STRESS-P".to_owned()),
        ..UserProfile::default()
    };
    if let Err(e) = engine.register_user(OWNER, owner) {
        eprintln!("cannot register owner: {e}");
        std::process::exit(1);
    }

    let mut timings = Timings {
        enroll: Duration::ZERO,
        race: Duration::ZERO,
    };
    let mut failures = 0u64;

    for cycle in 1..=cycles {
        if let Err(msg) = run_cycle(&engine, cycle, riders, &mut timings) {
            eprintln!("  {msg}");
            failures += 1;
        }
        if cycle % 100 == 0 {
            let elapsed = timings.enroll + timings.race;
            println!(
                "  cycle {cycle}/{cycles}: {:.1}s elapsed, {failures} failures",
                elapsed.as_secs_f64()
            );
        }
    }

    println!();
    println!("============================================");
    println!("Results: {cycles} cycles, {failures} failures");
    println!(
        "  enroll: {:.3}s total, {:.3}ms avg",
        timings.enroll.as_secs_f64(),
        timings.enroll.as_secs_f64() * 1000.0 / cycles.max(1) as f64
    );
    println!(
        "  race:   {:.3}s total, {:.3}ms avg",
        timings.race.as_secs_f64(),
        timings.race.as_secs_f64() * 1000.0 / cycles.max(1) as f64
    );
    println!("  trips remaining: {}", engine.list_trips().len());

    if failures > 0 {
        eprintln!("\nSTRESS TEST FAILED");
        std::process::exit(1);
    } else {
        println!("\nSTRESS TEST PASSED");
    }
}

use carpool_core::{BookingEngine, ManualClock};
use carpool_schema::{BookingPolicy, TripRequest, UserProfile};
use chrono::Duration;
use criterion::{criterion_group, criterion_main, Criterion};
use std::sync::{Arc, Barrier};
use std::thread;

fn engine_with_owner() -> BookingEngine {
    let engine = BookingEngine::with_clock(
        BookingPolicy::default(),
        Arc::new(ManualClock::default()),
    );
    engine
        .register_user(
            "owner",
            UserProfile {
                is_car_owner: true,
                driver_license: Some("L-1".to_owned()),
                car_plate_number: Some("P-1".to_owned()),
                ..UserProfile::default()
            },
        )
        .unwrap();
    engine
}

fn request(engine: &BookingEngine, seats: i32) -> TripRequest {
    TripRequest {
        car_owner_id: "owner".into(),
        pickup_location: "depot".to_owned(),
        alt_pickup_location: None,
        start_time: engine.now() + Duration::hours(2),
        destination: "terminal".to_owned(),
        total_seats: seats,
    }
}

fn bench_create_trip(c: &mut Criterion) {
    c.bench_function("create_trip_into_100", |b| {
        b.iter_with_setup(
            || {
                let engine = engine_with_owner();
                for i in 0..100 {
                    engine
                        .create_trip(&format!("seed-{i:03}"), request(&engine, 4))
                        .unwrap();
                }
                let req = request(&engine, 4);
                (engine, req)
            },
            |(engine, req)| {
                engine.create_trip("bench", req).unwrap();
            },
        );
    });
}

fn bench_enroll_sequential(c: &mut Criterion) {
    c.bench_function("enroll_50_passengers", |b| {
        b.iter_with_setup(
            || {
                let engine = engine_with_owner();
                engine.create_trip("T", request(&engine, 50)).unwrap();
                engine
            },
            |engine| {
                for i in 0..50 {
                    engine.enroll_passenger("T", &format!("rider-{i}")).unwrap();
                }
            },
        );
    });
}

fn bench_enroll_contended(c: &mut Criterion) {
    c.bench_function("enroll_8_threads_same_trip", |b| {
        b.iter_with_setup(
            || {
                let engine = Arc::new(engine_with_owner());
                engine.create_trip("T", request(&engine, 4)).unwrap();
                engine
            },
            |engine| {
                let barrier = Arc::new(Barrier::new(8));
                let handles: Vec<_> = (0..8)
                    .map(|i| {
                        let e = Arc::clone(&engine);
                        let b = Arc::clone(&barrier);
                        thread::spawn(move || {
                            b.wait();
                            e.enroll_passenger("T", &format!("rider-{i}")).unwrap();
                        })
                    })
                    .collect();
                for h in handles {
                    h.join().unwrap();
                }
            },
        );
    });
}

fn bench_list_trips(c: &mut Criterion) {
    let engine = engine_with_owner();
    for i in 0..500 {
        engine
            .create_trip(&format!("trip-{i:04}"), request(&engine, 3))
            .unwrap();
    }
    c.bench_function("list_500_trips", |b| {
        b.iter(|| engine.list_trips().len());
    });
}

criterion_group!(
    benches,
    bench_create_trip,
    bench_enroll_sequential,
    bench_enroll_contended,
    bench_list_trips,
);
criterion_main!(benches);

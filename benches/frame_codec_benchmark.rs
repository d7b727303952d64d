use criterion::{black_box, criterion_group, criterion_main, Criterion};

use ethlb::frame::{build_common_header, build_eth_frame, build_lb_pdu, parse_lb_pdu, MacAddress, Opcode};

fn bench_build_lb_pdu(c: &mut Criterion) {
    let header = build_common_header(0, 0, Opcode::Lbm, 0, 4);
    c.bench_function("build_lb_pdu", |b| {
        b.iter(|| build_lb_pdu(black_box(header), black_box(0x1234_5678), black_box(0)))
    });
}

fn bench_parse_lb_pdu(c: &mut Criterion) {
    let header = build_common_header(0, 0, Opcode::Lbm, 0, 4);
    let bytes = build_lb_pdu(header, 0x1234_5678, 0);
    c.bench_function("parse_lb_pdu", |b| {
        b.iter(|| parse_lb_pdu(black_box(&bytes)))
    });
}

fn bench_build_eth_frame(c: &mut Criterion) {
    let dst = MacAddress::broadcast();
    let src = MacAddress::new([0x00, 0x11, 0x22, 0x33, 0x44, 0x55]);
    let header = build_common_header(0, 0, Opcode::Lbm, 0, 4);
    let pdu = build_lb_pdu(header, 1, 0);
    c.bench_function("build_eth_frame", |b| {
        b.iter(|| build_eth_frame(black_box(dst), black_box(src), black_box(0x8902), black_box(&pdu)))
    });
}

criterion_group!(benches, bench_build_lb_pdu, bench_parse_lb_pdu, bench_build_eth_frame);
criterion_main!(benches);

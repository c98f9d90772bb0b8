#![cfg(not(target_arch = "wasm32"))]

use aero_gpu_printf::{
    decode_print_buffer, FormatString, GpuPrinting, PrintArg, PrintBufferWriter, PrintStream,
    StringTable,
};
use proptest::prelude::*;

const FORMATS: &[&str] = &["%d", "%u %x", "%f|%e|%g", "%s=%c", "%5.2s%%%q", "plain", "%*d %ld"];

fn table() -> StringTable {
    let mut t = StringTable::new();
    t.load_strings(&FORMATS);
    t
}

fn arb_arg() -> impl Strategy<Value = PrintArg> {
    prop_oneof![
        any::<i32>().prop_map(PrintArg::Int),
        any::<u32>().prop_map(PrintArg::Uint),
        any::<u32>().prop_map(|bits| PrintArg::Float(f32::from_bits(bits))),
        any::<bool>().prop_map(PrintArg::Bool),
        prop::sample::select(FORMATS).prop_map(PrintArg::string),
        any::<u32>().prop_map(PrintArg::StringHash),
    ]
}

proptest! {
    #[test]
    fn arbitrary_bytes_never_panic(bytes in prop::collection::vec(any::<u8>(), 4..512)) {
        let strings = table();
        let decoded = decode_print_buffer(&strings, &bytes).unwrap();

        let stream = PrintStream::new(&bytes).unwrap();
        let mut end = 4usize;
        for cmd in stream.commands(&strings) {
            prop_assert_eq!(cmd.offset, end);
            end += cmd.len_bytes();
        }
        prop_assert!(end <= 4 + stream.payload_len());
        prop_assert!(end <= bytes.len());
        let overflowed = (stream.requested_bytes() as usize) > bytes.len() - 4;
        prop_assert_eq!(decoded.overflow.is_some(), overflowed);
    }

    #[test]
    fn small_cursor_over_random_payload_never_panics(
        cursor in any::<u32>(),
        payload in prop::collection::vec(any::<u8>(), 0..256),
        extra in 0usize..64,
    ) {
        let mut w = PrintBufferWriter::new();
        w.raw(&payload);
        let buffer = w.finish_with_cursor(4 + payload.len() + extra, cursor);
        let strings = table();
        let first = decode_print_buffer(&strings, &buffer).unwrap();
        let second = decode_print_buffer(&strings, &buffer).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn well_formed_streams_decode_completely(
        cmds in prop::collection::vec(
            (prop::sample::select(FORMATS), prop::collection::vec(arb_arg(), 0..3)),
            0..16,
        ),
    ) {
        let mut printing = GpuPrinting::new();
        printing.load_strings(&FORMATS);

        let mut w = PrintBufferWriter::new();
        let mut expected = 0usize;
        for (format, mut args) in cmds {
            let needed = FormatString::parse(format).placeholder_count();
            args.resize(needed, PrintArg::Uint(0));
            w.print(format, &args);
            expected += 1;
        }
        let buffer = w.finish(4 + w.payload_len());

        let mut out = Vec::<u8>::new();
        let mut err = Vec::<u8>::new();
        let summary = printing
            .process_gpu_print_commands_to(&buffer, &mut out, &mut err)
            .unwrap();
        prop_assert_eq!(summary.lines, expected);
        prop_assert!(summary.overflow.is_none());
        prop_assert!(err.is_empty());
        prop_assert!(expected == 0 || out.ends_with(b"\n"));
    }
}

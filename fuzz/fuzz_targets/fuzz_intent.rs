#![no_main]

use fogline::actions::parse_intent;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    // Any accepted intent must survive a trip through its canonical form.
    if let Ok(action) = parse_intent(text) {
        let again = parse_intent(&action.to_intent()).expect("canonical intent parses");
        assert_eq!(again, action);
    }
});

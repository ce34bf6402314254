#![allow(dead_code)]

use renogy_modbus::capture::RegisterImage;

pub fn common_setup() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub struct Factory();
impl Factory {
    /// A four-cell battery resting at 13.3V, discharging 12.34A.
    ///
    /// The environment temperature block is left out, as on real packs.
    pub fn battery() -> RegisterImage {
        let mut image = RegisterImage::new();

        image.set_words(5000, &[4, 33, 33, 34, 32]); // cell voltages
        image.set_words(5017, &[4, 250, 251, 0xFFF6, 245]); // cell temperatures
        image.set_word(5035, 215);
        image.set_words(5039, &[2, 0xFF9C, 50]); // heater temperatures
        image.set_word(5042, 0xFB2E); // -12.34A
        image.set_word(5043, 133);
        image.set_composite(5044, 75_500);
        image.set_composite(5046, 100_000);
        image.set_word(5048, 12);
        image.set_words(5049, &[144, 100, 5000, 10000]);

        image.set_composite(5100, 0x0001_0084); // cell_2 low, cell_4 high
        image.set_composite(5102, 0);
        image.set_composite(5104, 0x8000_0000); // bms temperature high
        image.set_word(5106, 0b110); // both mosfets on
        image.set_word(5107, 0x2800); // fully charged, heater on
        image.set_word(5108, 0);
        image.set_word(5109, 0xC0); // charge and discharge enabled

        image.set_ascii(5110, "BT2024A0001", 8);
        image.set_ascii(5118, "A1", 1);
        image.set_ascii(5119, "0107", 2);
        image.set_ascii(5121, "02", 1);
        image.set_ascii(5122, "RBT100LFP12S", 8);

        image.set_words(5200, &[38, 36, 28, 25]);
        image.set_words(5204, &[600, 550, 0, 50]);
        image.set_words(5208, &[11000, 10500, 1000]);
        image.set_words(5211, &[150, 146, 112, 100]);
        image.set_words(5215, &[650, 600, 0xFF9C, 0xFF38]);
        image.set_words(5219, &[15000, 12500, 11000]);

        image.clear_requests();
        image
    }

    /// A DCC50S charging a LiFePO4 bank from both alternator and solar.
    pub fn dcc50s() -> RegisterImage {
        let mut image = RegisterImage::new();

        image.set_word(0x0A, 0x0C32); // 12V / 50A
        image.set_ascii(0x0C, "RNG-DCC50S", 8);
        image.set_composite(0x14, 0x0001_020A);
        image.set_composite(0x16, 0x0001_0000);
        image.set_composite(0x18, 0x0000_ABCD);

        image.set_word(0x100, 87);
        image.set_word(0x101, 132);
        image.set_word(0x102, 1550);
        image.set_word(0x103, 0x19F6); // 25C inside, -10C outside
        image.set_words(0x104, &[140, 1000, 140]);
        image.set_words(0x107, &[205, 550, 113]);

        image.set_word(0x120, 0x05); // charging, mppt
        image.set_word(0x121, 0);
        image.set_word(0x122, 0x200); // bms overcharge protection

        image.set_word(0xE001, 5000);
        image.set_word(0xE002, 100);
        image.set_word(0xE004, 4);

        image.clear_requests();
        image
    }
}

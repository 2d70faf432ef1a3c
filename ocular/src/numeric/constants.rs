//! Physical constants and unit prefixes (CODATA 2018, SI)

use std::f64::consts::PI;

/// Named constants served by the registry, in help-listing order
pub const CONSTANTS: &[(&str, f64)] = &[
    ("c", 299_792_458.0),
    ("e", 1.602_176_634e-19),
    ("pi", PI),
    ("mu_0", 1.256_637_062_12e-6),
    ("epsilon_0", 8.854_187_812_8e-12),
    ("h", 6.626_070_15e-34),
    ("hbar", 1.054_571_817e-34),
    ("G", 6.674_30e-11),
    ("g", 9.806_65),
    ("R", 8.314_462_618),
    ("alpha", 7.297_352_569_3e-3),
    ("N_A", 6.022_140_76e23),
    ("k", 1.380_649e-23),
    ("sigma", 5.670_374_419e-8),
    ("Wien", 2.897_771_955e-3),
    ("Rydberg", 10_973_731.568_160),
    ("m_e", 9.109_383_701_5e-31),
    ("m_p", 1.672_621_923_69e-27),
    ("m_n", 1.674_927_498_04e-27),
    ("yotta", 1e24),
    ("zetta", 1e21),
    ("exa", 1e18),
    ("peta", 1e15),
    ("tera", 1e12),
    ("giga", 1e9),
    ("mega", 1e6),
    ("kilo", 1e3),
    ("hecto", 1e2),
    ("deka", 1e1),
    ("deci", 1e-1),
    ("centi", 1e-2),
    ("milli", 1e-3),
    ("micro", 1e-6),
    ("nano", 1e-9),
    ("pico", 1e-12),
    ("femto", 1e-15),
    ("atto", 1e-18),
    ("zepto", 1e-21),
    ("kibi", 1024.0),
    ("mebi", 1_048_576.0),
    ("gibi", 1_073_741_824.0),
    ("tebi", 1_099_511_627_776.0),
    ("pebi", 1_125_899_906_842_624.0),
    ("exbi", 1_152_921_504_606_846_976.0),
    ("zebi", 1_180_591_620_717_411_303_424.0),
    ("yobi", 1_208_925_819_614_629_174_706_176.0),
    ("golden", 1.618_033_988_749_895),
];

pub fn constant(name: &str) -> Option<f64> {
    CONSTANTS
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, v)| *v)
}

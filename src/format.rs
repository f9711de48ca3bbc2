pub const MILLION: u64 = 1_000_000;
/// One standard atmosphere, in pascals.
pub const STANDARD_PRESSURE: u64 = 100_000;

const KM_PER_AU_IN_MKM: u64 = 150;
const SECONDS_PER_MINUTE: u64 = 60;
const MINUTES_PER_HOUR: u64 = 60;
const HOURS_PER_DAY: u64 = 24;
const DAYS_PER_YEAR: u64 = 365;

/// `"<count> <noun> "` with a naive plural, or nothing at all for zero.
pub fn pluralize(count: u64, noun: &str) -> String {
    match count {
        0 => String::new(),
        1 => format!("1 {} ", noun),
        n => format!("{} {}s ", n, noun),
    }
}

/// Integer with en-GB thousands separators.
pub fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

pub fn format_distance(km: u64) -> String {
    if km < 10 * MILLION {
        return format!("{} km", group_thousands(km));
    }

    let mkm = km / MILLION;
    let mut result = format!("{} Mkm", group_thousands(mkm));
    if km >= 1000 * MILLION {
        let au = mkm / KM_PER_AU_IN_MKM;
        result.push_str(&format!(" ({} AU)", group_thousands(au)));
    }
    result
}

pub fn format_pressure(pascals: u64) -> String {
    if pascals >= 10 * STANDARD_PRESSURE {
        format!("{} x Std", pascals / STANDARD_PRESSURE)
    } else if pascals * 20 >= STANDARD_PRESSURE {
        // 0.05 x Std and up.
        format!("{}% Std", pascals * 100 / STANDARD_PRESSURE)
    } else {
        let tenths = pascals * 1000 / STANDARD_PRESSURE;
        if tenths % 10 == 0 {
            format!("{}% Std", tenths / 10)
        } else {
            format!("{}.{}% Std", tenths / 10, tenths % 10)
        }
    }
}

/// Calendar breakdown of a duration, dropping fine detail as it grows longer.
pub fn format_period(seconds: u64) -> String {
    let s = seconds % SECONDS_PER_MINUTE;
    let minutes = seconds / SECONDS_PER_MINUTE;
    let m = minutes % MINUTES_PER_HOUR;
    let hours = minutes / MINUTES_PER_HOUR;
    let h = hours % HOURS_PER_DAY;
    let days = hours / HOURS_PER_DAY;
    let d = days % DAYS_PER_YEAR;
    let y = days / DAYS_PER_YEAR;

    let mut period = pluralize(y, "year");
    if y < 30 {
        period.push_str(&pluralize(d, "day"));
    }
    if y == 0 && d < 30 {
        period.push_str(&pluralize(h, "hour"));
    }
    if y == 0 && d < 7 {
        period.push_str(&pluralize(m, "minute"));
    }
    if y == 0 && d == 0 && h < 10 {
        period.push_str(&pluralize(s, "second"));
    }

    period.trim_end().to_string()
}

/// Resource density (tenths of a percent) as a percentage figure, three
/// significant figures from 100% upwards and two below.
pub fn format_density(density: u32) -> String {
    let precision = if density >= 1000 { 3 } else { 2 };
    to_precision_tenths(u64::from(density), precision)
}

/// `Number.prototype.toPrecision` for `tenths / 10`, rounding ties upwards.
fn to_precision_tenths(tenths: u64, precision: u32) -> String {
    if tenths == 0 {
        return format!("0.{}", "0".repeat(precision as usize - 1));
    }

    let mut len = digit_count(tenths);
    let mut mantissa = if len > precision {
        let divisor = 10u64.pow(len - precision);
        (tenths + divisor / 2) / divisor
    } else {
        tenths * 10u64.pow(precision - len)
    };
    if mantissa >= 10u64.pow(precision) {
        mantissa /= 10;
        len += 1;
    }

    // Decimal exponent of the leading digit; the value is scaled by 1/10.
    let exponent = len as i64 - 2;
    let digits = mantissa.to_string();
    let precision = precision as i64;

    if exponent < -6 || exponent >= precision {
        let (lead, rest) = digits.split_at(1);
        let sign = if exponent < 0 { '-' } else { '+' };
        if rest.is_empty() {
            format!("{}e{}{}", lead, sign, exponent.abs())
        } else {
            format!("{}.{}e{}{}", lead, rest, sign, exponent.abs())
        }
    } else if exponent >= 0 {
        let int_len = (exponent + 1) as usize;
        if int_len >= digits.len() {
            digits
        } else {
            format!("{}.{}", &digits[..int_len], &digits[int_len..])
        }
    } else {
        let zeros = "0".repeat((-exponent - 1) as usize);
        format!("0.{}{}", zeros, digits)
    }
}

fn digit_count(mut n: u64) -> u32 {
    let mut count = 1;
    while n >= 10 {
        n /= 10;
        count += 1;
    }
    count
}

/// Kelvin with a rough Celsius readout alongside.
pub fn format_temperature(kelvin: i32) -> String {
    format!("{} K ({} °C)", kelvin, kelvin.saturating_sub(273))
}

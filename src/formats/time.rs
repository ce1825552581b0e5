use anyhow::{Result, anyhow};

pub fn frames_to_ms(frames: i64, fps: f64) -> i64 {
    if fps <= 0.0 {
        return 0;
    }
    (frames as f64 * 1000.0 / fps).round() as i64
}

pub fn frames_to_seconds(frames: i64, fps: f64) -> f64 {
    frames_to_ms(frames, fps) as f64 / 1000.0
}

pub fn format_srt_timestamp(ms: i64) -> String {
    format_timestamp(ms, ',')
}

pub fn format_vtt_timestamp(ms: i64) -> String {
    format_timestamp(ms, '.')
}

fn format_timestamp(ms_in: i64, ms_sep: char) -> String {
    let ms = ms_in.max(0);

    let total_seconds = ms / 1000;
    let milli = ms % 1000;

    let sec = total_seconds % 60;
    let total_minutes = total_seconds / 60;
    let min = total_minutes % 60;
    let hour = total_minutes / 60;

    format!("{hour:02}:{min:02}:{sec:02}{ms_sep}{milli:03}")
}

pub fn parse_time_to_ms(s: &str) -> Result<i64> {
    let t = s.trim().trim_end_matches('s');

    if let Ok(v) = t.parse::<i64>() {
        return Ok(v * 1000);
    }

    if let Ok(v) = t.parse::<f64>() {
        let ms = (v * 1000.0).round() as i64;
        return Ok(ms);
    }

    let (hms, milli) = if let Some((a, b)) = t.split_once(',') {
        (a, Some(b))
    } else if let Some((a, b)) = t.split_once('.') {
        (a, Some(b))
    } else {
        (t, None)
    };

    let parts: Vec<&str> = hms.split(':').collect();
    if parts.len() != 3 {
        return Err(anyhow!("unrecognized timestamp: '{t}'"));
    }

    let h: i64 = parts[0].parse().map_err(|_| anyhow!("bad hours: '{t}'"))?;
    let m: i64 = parts[1]
        .parse()
        .map_err(|_| anyhow!("bad minutes: '{t}'"))?;
    let s2: i64 = parts[2]
        .parse()
        .map_err(|_| anyhow!("bad seconds: '{t}'"))?;

    let mut ms = ((h * 60 + m) * 60 + s2) * 1000;

    if let Some(frac) = milli {
        let mut frac_s = frac.trim().to_string();
        if frac_s.len() > 3 {
            frac_s.truncate(3);
        }
        while frac_s.len() < 3 {
            frac_s.push('0');
        }
        let milli: i64 = frac_s
            .parse()
            .map_err(|_| anyhow!("bad milliseconds: '{t}'"))?;
        ms += milli;
    }

    Ok(ms)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frames_convert_at_fps() {
        assert_eq!(frames_to_ms(45, 30.0), 1500);
        assert_eq!(frames_to_ms(1, 30.0), 33);
        assert_eq!(frames_to_seconds(90, 30.0), 3.0);
    }

    #[test]
    fn timestamps_format_with_separator() {
        assert_eq!(format_srt_timestamp(3_723_004), "01:02:03,004");
        assert_eq!(format_vtt_timestamp(1500), "00:00:01.500");
        assert_eq!(format_vtt_timestamp(-10), "00:00:00.000");
    }

    #[test]
    fn clip_lengths_parse_as_seconds_or_timestamps() {
        assert_eq!(parse_time_to_ms("2").unwrap(), 2000);
        assert_eq!(parse_time_to_ms("2.4").unwrap(), 2400);
        assert_eq!(parse_time_to_ms("1.5s").unwrap(), 1500);
        assert_eq!(parse_time_to_ms("00:00:02,400").unwrap(), 2400);
        assert!(parse_time_to_ms("soon").is_err());
    }
}

//! CSV file sources integration

use std::io::Read;

use csv::{Reader, StringRecord};
use geo::geometry::Point;
use time::format_description::well_known;
use time::OffsetDateTime;
use tracing::{debug, warn};

use super::{CandidatesSource, SampleFields, SamplesSource};
use crate::fusion::RawSample;
use crate::radar::Candidate;
use crate::NavError;

const ID: &[&str] = &["id", "ID"];
const LATITUDE: &[&str] = &["latitude", "lat", "Latitude", "y"];
const LONGITUDE: &[&str] = &["longitude", "lon", "Longitude", "x"];
const KIND: &[&str] = &["type", "Type", "equipement"];
const ROAD: &[&str] = &["route", "Route"];
const TOWN: &[&str] = &["commune", "localisation"];
const DEPARTMENT: &[&str] = &["departement", "departement_code"];
const LIMIT: &[&str] = &["vitesse_vehicules_legers_kmh", "Vitesse", "vitesse"];
const HEAVY_LIMIT: &[&str] = &["vitesse_poids_lourds_kmh", "Vitesse_PL", "vitesse_pl"];

/// Radar CSV source, with the column names of the french open data sets
pub struct CsvRadarSource<T>
where
    T: Read,
{
    rdr: Reader<T>,
}

impl<T> CsvRadarSource<T>
where
    T: Read,
{
    pub fn new(rdr: Reader<T>) -> Self {
        Self { rdr }
    }
}

impl<T> CandidatesSource for CsvRadarSource<T>
where
    T: Read,
{
    fn fetch(&mut self) -> Result<Vec<Candidate>, NavError> {
        let mut radars = vec![];
        let mut dropped = 0;

        let mut header = self
            .rdr
            .headers()
            .map_err(|e| NavError::Csv(format!("Failed on read the header: {}", e)))?
            .clone();
        header.trim();
        let index = RadarIndex::parse(&header)?;

        for (i, row) in self.rdr.records().enumerate() {
            let mut rec = match row {
                Ok(rec) => rec,
                Err(e) => {
                    warn!(row = i + 1, "Radar row ignored: {}", e);
                    dropped += 1;
                    continue;
                }
            };
            rec.trim();

            match index.parse_row(&rec) {
                Some(radar) => radars.push(radar),
                None => {
                    debug!(row = i + 1, "Radar row ignored: invalid coordinates");
                    dropped += 1;
                }
            }
        }

        debug!(loaded = radars.len(), dropped, "Radars loaded");

        Ok(radars)
    }
}

/// Candidate columns of every alias present, in priority order
#[derive(Debug)]
struct RadarIndex {
    id: Vec<usize>,
    lat: Vec<usize>,
    lon: Vec<usize>,
    kind: Vec<usize>,
    road: Vec<usize>,
    town: Vec<usize>,
    department: Vec<usize>,
    limit: Vec<usize>,
    heavy_limit: Vec<usize>,
}

impl RadarIndex {
    fn parse(header: &StringRecord) -> Result<Self, NavError> {
        let columns = |aliases: &[&str]| -> Vec<usize> {
            aliases
                .iter()
                .filter_map(|a| header.iter().position(|h| h == *a))
                .collect()
        };

        let lat = columns(LATITUDE);
        if lat.is_empty() {
            return Err(NavError::MissingColumn("Latitude"));
        }
        let lon = columns(LONGITUDE);
        if lon.is_empty() {
            return Err(NavError::MissingColumn("Longitude"));
        }

        Ok(Self {
            id: columns(ID),
            lat,
            lon,
            kind: columns(KIND),
            road: columns(ROAD),
            town: columns(TOWN),
            department: columns(DEPARTMENT),
            limit: columns(LIMIT),
            heavy_limit: columns(HEAVY_LIMIT),
        })
    }

    fn parse_row(&self, row: &StringRecord) -> Option<Candidate> {
        let lat = pick(row, &self.lat)?.parse::<f64>().ok().filter(|v| v.is_finite())?;
        let lon = pick(row, &self.lon)?.parse::<f64>().ok().filter(|v| v.is_finite())?;

        let text = |cols: &[usize]| pick(row, cols).unwrap_or_default().to_string();
        let limit = |cols: &[usize]| {
            pick(row, cols)
                .and_then(|v| v.parse::<f64>().ok())
                .filter(|v| v.is_finite() && *v >= 1.0)
                .map(|v| v.trunc() as u32)
        };

        let mut radar = Candidate::basic(text(&self.id), Point::new(lon, lat));
        radar.kind = text(&self.kind);
        radar.road = text(&self.road);
        radar.town = text(&self.town);
        radar.department = text(&self.department);
        radar.limit = limit(&self.limit);
        radar.heavy_limit = limit(&self.heavy_limit);

        Some(radar)
    }
}

/// First non empty value among the columns
fn pick<'r>(row: &'r StringRecord, cols: &[usize]) -> Option<&'r str> {
    cols.iter()
        .filter_map(|c| row.get(*c))
        .find(|v| !v.is_empty())
}

/// Position samples CSV source
pub struct CsvSampleSource<T>
where
    T: Read,
{
    rdr: Reader<T>,
    fields: SampleFields,
}

impl<T> CsvSampleSource<T>
where
    T: Read,
{
    pub fn new(rdr: Reader<T>, fields: Option<SampleFields>) -> Self {
        Self {
            rdr,
            fields: fields.unwrap_or_default(),
        }
    }
}

impl<T> SamplesSource for CsvSampleSource<T>
where
    T: Read,
{
    fn fetch(&mut self) -> Result<Vec<RawSample>, NavError> {
        let mut samples = vec![];

        let mut header = self
            .rdr
            .headers()
            .map_err(|e| NavError::Csv(format!("Failed on read the header: {}", e)))?
            .clone();
        let header_idx = parse_header(&self.fields, &mut header)?;

        for (i, row) in self.rdr.records().enumerate() {
            let mut rec = row.map_err(|e| NavError::Csv(format!("Failed on read some row: {}", e)))?;

            if rec.len() < 2 {
                continue;
            }

            if let Some(sample) = parse_row(&header_idx, &self.fields, &mut rec)
                .map_err(|e| NavError::invalid_row(i + 1, e))?
            {
                samples.push(sample);
            }
        }

        Ok(samples)
    }
}

/// Field to index map
#[derive(Debug)]
struct FieldsIndex {
    coordinates: usize,
    time: usize,
    accuracy: usize,
    speed: Option<usize>,
    heading: Option<usize>,
}

fn parse_header(fields: &SampleFields, header: &mut StringRecord) -> Result<FieldsIndex, NavError> {
    header.trim();

    let position = |name: &str| header.iter().position(|h| h.to_lowercase() == name);

    let coordinates = position(fields.coordinates.as_str()).ok_or(NavError::MissingColumn("Coordinates"))?;
    let time = position(fields.time.as_str()).ok_or(NavError::MissingColumn("Time"))?;
    let accuracy = position(fields.accuracy.as_str()).ok_or(NavError::MissingColumn("Accuracy"))?;

    Ok(FieldsIndex {
        coordinates,
        time,
        accuracy,
        speed: position(fields.speed.as_str()),
        heading: position(fields.heading.as_str()),
    })
}

fn parse_row(
    header: &FieldsIndex,
    fields: &SampleFields,
    row: &mut StringRecord,
) -> Result<Option<RawSample>, String> {
    row.trim();

    let raw_coordinates = row.get(header.coordinates).ok_or("Coordinates field not found")?;
    let separator = match raw_coordinates {
        s if s.contains(',') => ",",
        s if s.contains(';') => ";",
        _ => " ",
    };
    let scoordinates: Vec<&str> = raw_coordinates.split(separator).map(|s| s.trim()).collect();
    if scoordinates.len() != 2 {
        return Ok(None);
    }

    let (ilat, ilng) = if fields.flip_coordinates { (0, 1) } else { (1, 0) };

    let lat = scoordinates[ilat]
        .parse::<f64>()
        .map_err(|e| format!("Invalid latitude format: {}", e))?;
    let lng = scoordinates[ilng]
        .parse::<f64>()
        .map_err(|e| format!("Invalid longitude format: {}", e))?;

    let time = match row.get(header.time) {
        Some(d) => OffsetDateTime::parse(d, &well_known::Rfc3339)
            .map_err(|e| format!("Failed on parse the time: {}", e)),
        None => Err("Time field not found".to_string()),
    }?;
    let timestamp = u64::try_from(time.unix_timestamp_nanos() / 1_000_000)
        .map_err(|_| "Time before the unix epoch".to_string())?;

    let number = |idx: Option<usize>| idx.and_then(|i| row.get(i)).and_then(|d| d.parse::<f64>().ok());

    // Unknown accuracy never passes the accuracy gate
    let accuracy = number(Some(header.accuracy)).unwrap_or(f64::NAN);

    let mut sample = RawSample::basic(Point::new(lng, lat), accuracy, timestamp);
    sample.speed = number(header.speed);
    sample.heading = number(header.heading);

    Ok(Some(sample))
}

#[cfg(test)]
pub mod tests {
    use csv::ReaderBuilder;
    use geo::geometry::Point;
    use time::macros::datetime;

    use super::{CsvRadarSource, CsvSampleSource};
    use crate::sources::{CandidatesSource, SampleFields, SamplesSource};
    use crate::NavError;

    #[test]
    fn radars() -> Result<(), String> {
        let data = "id,latitude,longitude,type,route,commune,departement,vitesse_vehicules_legers_kmh,vitesse_poids_lourds_kmh
R1,48.86,2.35,Radar fixe,A6,Paris,75,80,70
R2,48.87,2.36,,,,,,
R3,,2.36,Radar fixe,,,,,
R4,abc,2.36,Radar fixe,,,,,
R5,NaN,2.36,Radar fixe,,,,,
";
        let rdr = ReaderBuilder::new().flexible(true).from_reader(data.as_bytes());
        let radars = CsvRadarSource::new(rdr).fetch().map_err(|e| e.to_string())?;

        assert_eq!(2, radars.len());
        let r1 = &radars[0];
        assert_eq!("R1", r1.id);
        assert_eq!(Point::new(2.35, 48.86), r1.coordinates);
        assert_eq!("Radar fixe", r1.kind);
        assert_eq!("A6", r1.road);
        assert_eq!("Paris", r1.town);
        assert_eq!("75", r1.department);
        assert_eq!(Some(80), r1.limit);
        assert_eq!(Some(70), r1.heavy_limit);

        let r2 = &radars[1];
        assert_eq!("", r2.kind);
        assert_eq!(None, r2.limit);

        Ok(())
    }

    #[test]
    fn radars_aliases() -> Result<(), String> {
        let data = "ID,y,x,equipement,Vitesse
7,48.86,2.35,Radar feu rouge,50
8,48.87,2.36,Radar tourelle,0
";
        let rdr = ReaderBuilder::new().flexible(true).from_reader(data.as_bytes());
        let radars = CsvRadarSource::new(rdr).fetch().map_err(|e| e.to_string())?;

        assert_eq!(2, radars.len());
        assert_eq!("7", radars[0].id);
        assert_eq!(Point::new(2.35, 48.86), radars[0].coordinates);
        assert_eq!("Radar feu rouge", radars[0].kind);
        assert_eq!(Some(50), radars[0].limit);
        assert_eq!(None, radars[1].limit);

        Ok(())
    }

    #[test]
    fn radars_without_coordinates() {
        let data = "id,type\nR1,Radar fixe\n";
        let rdr = ReaderBuilder::new().from_reader(data.as_bytes());
        let res = CsvRadarSource::new(rdr).fetch();
        assert!(matches!(res, Err(NavError::MissingColumn("Latitude"))));
    }

    #[test]
    fn samples() -> Result<(), String> {
        let data = "coordinates,time,accuracy,speed,heading
\"2.35, 48.86\",\"2023-05-24T10:00:00.000+00:00\",5,13.9,10
\"2.35 48.8605\",\"2023-05-24T10:00:01.000+00:00\",4.5,,
\"2.35;48.8610\",\"2023-05-24T10:00:01.500+00:00\",8,14.2,
";
        let rdr = ReaderBuilder::new().flexible(true).from_reader(data.as_bytes());
        let samples = CsvSampleSource::new(rdr, None).fetch().map_err(|e| e.to_string())?;

        assert_eq!(3, samples.len());
        assert_eq!(Point::new(2.35, 48.86), samples[0].coordinates);
        assert_eq!(5.0, samples[0].accuracy);
        assert_eq!(Some(13.9), samples[0].speed);
        assert_eq!(Some(10.0), samples[0].heading);
        assert_eq!(None, samples[1].speed);
        assert_eq!(1000, samples[1].timestamp - samples[0].timestamp);
        assert_eq!(500, samples[2].timestamp - samples[1].timestamp);
        let start = datetime!(2023-05-24 10:00 UTC).unix_timestamp() as u64 * 1000;
        assert_eq!(start, samples[0].timestamp);

        Ok(())
    }

    #[test]
    fn samples_custom_fields() -> Result<(), String> {
        let data = "Pos,When,Acc,Kmh,Course
\"48.86,2.35\",\"2023-05-24T10:00:00Z\",12,3.5,180
,\"2023-05-24T10:00:01Z\",12,,
\"48.87,2.35\",\"2023-05-24T10:00:02Z\",,,
";
        let fields = SampleFields::default()
            .coordinates("pos")
            .time("when")
            .accuracy("acc")
            .speed("kmh")
            .heading("course")
            .flip()
            .done();
        let rdr = ReaderBuilder::new().flexible(true).from_reader(data.as_bytes());
        let samples = CsvSampleSource::new(rdr, Some(fields))
            .fetch()
            .map_err(|e| e.to_string())?;

        // The row without coordinates is skipped
        assert_eq!(2, samples.len());
        assert_eq!(Point::new(2.35, 48.86), samples[0].coordinates);
        assert_eq!(12.0, samples[0].accuracy);
        assert_eq!(Some(3.5), samples[0].speed);
        assert_eq!(Some(180.0), samples[0].heading);
        assert!(samples[1].accuracy.is_nan());

        Ok(())
    }

    #[test]
    fn samples_without_accuracy() {
        let data = "coordinates,time\n\"2.35,48.86\",2023-05-24T10:00:00Z\n";
        let rdr = ReaderBuilder::new().from_reader(data.as_bytes());
        let res = CsvSampleSource::new(rdr, None).fetch();
        assert!(matches!(res, Err(NavError::MissingColumn("Accuracy"))));
    }

    #[test]
    fn samples_invalid_time() {
        let data = "coordinates,time,accuracy\n\"2.35,48.86\",yesterday,5\n";
        let rdr = ReaderBuilder::new().from_reader(data.as_bytes());
        let res = CsvSampleSource::new(rdr, None).fetch();
        assert!(matches!(res, Err(NavError::InvalidRow { row: 1, .. })));
    }
}

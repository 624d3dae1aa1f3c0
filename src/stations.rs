/// Station registry for the VIU coastal-mountain weather station network.
///
/// Defines the canonical list of stations processed by this service, along
/// with the variables each one provides. This is the single source of truth
/// for station names: all other modules should reference stations from here
/// rather than hardcoding table names. The registry is passed into the
/// orchestrator explicitly at the start of a batch run; nothing in the
/// engine reads it as global state.
///
/// A variable missing from a station's declared set usually means the
/// column does not exist in the clean database. More rarely the sensor is
/// present but too unreliable for automated cleaning (the Rennell Pass and
/// Plummer Hut snow rangers, for instance), in which case it is left out
/// deliberately.

use crate::model::{VAR_AIR_TEMP, VAR_PRECIP_CUMULATIVE, VAR_PRECIP_INCREMENT, VAR_SNOW_DEPTH};

// ---------------------------------------------------------------------------
// Station metadata
// ---------------------------------------------------------------------------

/// Metadata for a single weather station.
pub struct Station {
    /// Lowercase station key. Database tables are named
    /// `clean_<name>` and `qaqc_<name>`.
    pub name: &'static str,
    /// Capitalized name used in log output.
    pub display_name: &'static str,
    /// Human-readable description of the station's siting.
    pub description: &'static str,
    /// Which variables this station is expected to provide. Only variables
    /// with an engine profile are cleaned; the rest are declared so the
    /// registry matches the clean database schema.
    pub variables: &'static [&'static str],
}

/// All weather stations in the automated QA/QC rotation, ordered
/// alphabetically. Stations that are offline keep their entry (historical
/// reprocessing still needs them); their cutoff date lives in the override
/// table, not here.
pub static STATION_REGISTRY: &[Station] = &[
    Station {
        name: "apelake",
        display_name: "Apelake",
        description: "Ape Lake, south of Bella Coola. Full sensor suite \
                      including snow pillow SWE.",
        variables: &[
            VAR_AIR_TEMP,
            "RH",
            VAR_PRECIP_INCREMENT,
            VAR_PRECIP_CUMULATIVE,
            "PC_Raw_Pipe",
            "Wind_Speed",
            "Wind_Dir",
            "Pk_Wind_Speed",
            "Pk_Wind_Dir",
            VAR_SNOW_DEPTH,
            "SWE",
        ],
    },
    Station {
        name: "cainridgerun",
        display_name: "Cainridgerun",
        description: "Mount Cain ridge run, northern Vancouver Island. \
                      Wind-exposed ridge site.",
        variables: &[
            VAR_AIR_TEMP,
            "RH",
            VAR_PRECIP_INCREMENT,
            VAR_PRECIP_CUMULATIVE,
            "Wind_Speed",
            "Wind_Dir",
            "Pk_Wind_Speed",
            "Pk_Wind_Dir",
            VAR_SNOW_DEPTH,
        ],
    },
    Station {
        name: "claytonfalls",
        display_name: "Claytonfalls",
        description: "Clayton Falls Creek above Bella Coola harbour.",
        variables: &[
            VAR_AIR_TEMP,
            "RH",
            "BP",
            VAR_PRECIP_INCREMENT,
            VAR_PRECIP_CUMULATIVE,
            "PC_Raw_Pipe",
            "Wind_Speed",
            "Wind_Dir",
            "Pk_Wind_Speed",
            "Pk_Wind_Dir",
            VAR_SNOW_DEPTH,
            "SWE",
        ],
    },
    Station {
        name: "datlamen",
        display_name: "Datlamen",
        description: "Datlamen Pass, Haida Gwaii. Logger transmits on an \
                      off-hour schedule, so raw timestamps carry sub-hour \
                      jitter the regularizer has to floor away.",
        variables: &[
            VAR_AIR_TEMP,
            "RH",
            VAR_PRECIP_INCREMENT,
            VAR_PRECIP_CUMULATIVE,
            "Wind_Speed",
            "Wind_Dir",
            "Pk_Wind_Speed",
        ],
    },
    Station {
        name: "eastbuxton",
        display_name: "Eastbuxton",
        description: "East Buxton snow course, central Vancouver Island.",
        variables: &[
            VAR_AIR_TEMP,
            "RH",
            "BP",
            VAR_PRECIP_INCREMENT,
            VAR_PRECIP_CUMULATIVE,
            "PC_Raw_Pipe",
            "Wind_Speed",
            "Wind_Dir",
            VAR_SNOW_DEPTH,
        ],
    },
    Station {
        name: "klinaklini",
        display_name: "Klinaklini",
        description: "Klinaklini glacier forefield. Snow ranger needed two \
                      datum shifts since install; see the override table.",
        variables: &[
            VAR_AIR_TEMP,
            "RH",
            "BP",
            VAR_PRECIP_INCREMENT,
            VAR_PRECIP_CUMULATIVE,
            "PC_Raw_Pipe",
            "Wind_Speed",
            "Wind_Dir",
            "Pk_Wind_Speed",
            "Pk_Wind_Dir",
            VAR_SNOW_DEPTH,
            "SWE",
        ],
    },
    Station {
        name: "lowercain",
        display_name: "Lowercain",
        description: "Lower Mount Cain, in the trees below the ridge.",
        variables: &[
            VAR_AIR_TEMP,
            "RH",
            VAR_PRECIP_INCREMENT,
            VAR_PRECIP_CUMULATIVE,
            "PC_Raw_Pipe",
            VAR_SNOW_DEPTH,
            "SWE",
        ],
    },
    Station {
        name: "machmell",
        display_name: "Machmell",
        description: "Machmell River valley. Down since February 2023; kept \
                      in the rotation so historical water years can still be \
                      reprocessed up to its offline date.",
        variables: &[
            VAR_AIR_TEMP,
            "RH",
            VAR_PRECIP_INCREMENT,
            VAR_PRECIP_CUMULATIVE,
            "Wind_Speed",
            "Wind_Dir",
            "Pk_Wind_Speed",
        ],
    },
    Station {
        name: "mountarrowsmith",
        display_name: "Mountarrowsmith",
        description: "Mount Arrowsmith, above Port Alberni.",
        variables: &[
            VAR_AIR_TEMP,
            "RH",
            "BP",
            VAR_PRECIP_INCREMENT,
            VAR_PRECIP_CUMULATIVE,
            "PC_Raw_Pipe",
            "Wind_Speed",
            "Wind_Dir",
            "Pk_Wind_Speed",
            "Pk_Wind_Dir",
            VAR_SNOW_DEPTH,
            "SWE",
        ],
    },
    Station {
        name: "mountcayley",
        display_name: "Mountcayley",
        description: "Mount Cayley, Squamish backcountry. The 2022-23 water \
                      year is unrecoverable and suppressed in the override \
                      table.",
        variables: &[
            VAR_AIR_TEMP,
            "RH",
            "BP",
            VAR_PRECIP_INCREMENT,
            VAR_PRECIP_CUMULATIVE,
            "Wind_Speed",
            "Wind_Dir",
            "Pk_Wind_Speed",
            "Pk_Wind_Dir",
            VAR_SNOW_DEPTH,
        ],
    },
    Station {
        name: "mountmaya",
        display_name: "Mountmaya",
        description: "Mount Maya. Offline since November 2024.",
        variables: &[
            VAR_AIR_TEMP,
            "RH",
            "BP",
            VAR_PRECIP_INCREMENT,
            VAR_PRECIP_CUMULATIVE,
            "PC_Raw_Pipe",
            "Wind_Speed",
            "Wind_Dir",
            "Pk_Wind_Speed",
            VAR_SNOW_DEPTH,
        ],
    },
    Station {
        name: "perseverance",
        display_name: "Perseverance",
        description: "Perseverance Creek headwaters, Cumberland forest.",
        variables: &[
            VAR_AIR_TEMP,
            "RH",
            "BP",
            VAR_PRECIP_INCREMENT,
            VAR_PRECIP_CUMULATIVE,
            "PC_Raw_Pipe",
            "Wind_Speed",
            "Wind_Dir",
            "Pk_Wind_Speed",
            "Pk_Wind_Dir",
            VAR_SNOW_DEPTH,
            "SWE",
        ],
    },
    Station {
        name: "plummerhut",
        display_name: "Plummerhut",
        description: "Plummer Hut, Waddington massif. Snow ranger excluded: \
                      rime and glacier wind defeat automated cleaning.",
        variables: &[
            VAR_AIR_TEMP,
            "RH",
            "BP",
            VAR_PRECIP_INCREMENT,
            VAR_PRECIP_CUMULATIVE,
            "Wind_Speed",
            "Wind_Dir",
            "Pk_Wind_Speed",
            "Pk_Wind_Dir",
        ],
    },
    Station {
        name: "rennellpass",
        display_name: "Rennellpass",
        description: "Rennell Pass, Haida Gwaii. Same off-hour logger \
                      schedule as Datlamen. Snow ranger excluded.",
        variables: &[
            VAR_AIR_TEMP,
            "RH",
            VAR_PRECIP_INCREMENT,
            VAR_PRECIP_CUMULATIVE,
            "Wind_Speed",
            "Wind_Dir",
            "Pk_Wind_Speed",
        ],
    },
    Station {
        name: "steph3",
        display_name: "Steph3",
        description: "Stephanie 3, Nanaimo Lakes plateau.",
        variables: &[
            VAR_AIR_TEMP,
            "RH",
            VAR_PRECIP_INCREMENT,
            VAR_PRECIP_CUMULATIVE,
            "Wind_Speed",
            "Wind_Dir",
            "Pk_Wind_Speed",
            VAR_SNOW_DEPTH,
        ],
    },
    Station {
        name: "steph6",
        display_name: "Steph6",
        description: "Stephanie 6, Nanaimo Lakes plateau.",
        variables: &[
            VAR_AIR_TEMP,
            "RH",
            VAR_PRECIP_INCREMENT,
            VAR_PRECIP_CUMULATIVE,
            "PC_Raw_Pipe",
            "Wind_Speed",
            "Wind_Dir",
            "Pk_Wind_Speed",
            VAR_SNOW_DEPTH,
        ],
    },
    Station {
        name: "tetrahedron",
        display_name: "Tetrahedron",
        description: "Tetrahedron plateau, Sunshine Coast watershed.",
        variables: &[
            VAR_AIR_TEMP,
            "RH",
            "BP",
            VAR_PRECIP_INCREMENT,
            VAR_PRECIP_CUMULATIVE,
            "PC_Raw_Pipe",
            "Wind_Speed",
            "Wind_Dir",
            "Pk_Wind_Speed",
            "Pk_Wind_Dir",
            VAR_SNOW_DEPTH,
            "SWE",
        ],
    },
    Station {
        name: "uppercruickshank",
        display_name: "Uppercruickshank",
        description: "Upper Cruickshank valley, Comox Lake headwaters.",
        variables: &[
            VAR_AIR_TEMP,
            "RH",
            "BP",
            VAR_PRECIP_INCREMENT,
            VAR_PRECIP_CUMULATIVE,
            "PC_Raw_Pipe",
            "Wind_Speed",
            "Wind_Dir",
            "Pk_Wind_Speed",
            "Pk_Wind_Dir",
            VAR_SNOW_DEPTH,
            "SWE",
        ],
    },
];

// ---------------------------------------------------------------------------
// Lookup helpers
// ---------------------------------------------------------------------------

/// Returns the names of all registered stations.
pub fn all_station_names() -> Vec<&'static str> {
    STATION_REGISTRY.iter().map(|s| s.name).collect()
}

/// Returns stations that declare a specific variable.
pub fn stations_with_variable(variable: &str) -> Vec<&'static str> {
    STATION_REGISTRY
        .iter()
        .filter(|s| s.variables.contains(&variable))
        .map(|s| s.name)
        .collect()
}

/// Checks if a station is expected to provide a specific variable.
pub fn station_has_variable(name: &str, variable: &str) -> bool {
    find_station(name)
        .map(|s| s.variables.contains(&variable))
        .unwrap_or(false)
}

/// Looks up a station by name. Returns `None` if not found.
pub fn find_station(name: &str) -> Option<&'static Station> {
    STATION_REGISTRY.iter().find(|s| s.name == name)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

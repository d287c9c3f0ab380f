//! Reference data for the licenses the built-in analyzer can recognise

use once_cell::sync::Lazy;

/// Shared instance; building the table is cheap but happens once per process
pub static LICENSE_DB: Lazy<LicenseDb> = Lazy::new(LicenseDb::new);

/// What the classifier knows about one license
#[derive(Debug, Clone)]
pub struct LicenseDescriptor {
    /// SPDX identifier, reported as the match name
    pub id: &'static str,
    /// Identifiers and aliases as they appear in free text
    pub spdx_patterns: &'static [&'static str],
    /// Phrases from the canonical text. More hits means higher confidence.
    pub text_patterns: &'static [&'static str],
}

/// In-memory license table
pub struct LicenseDb {
    licenses: Vec<LicenseDescriptor>,
}

impl LicenseDb {
    pub fn new() -> Self {
        Self {
            licenses: build_database(),
        }
    }

    pub fn all(&self) -> &[LicenseDescriptor] {
        &self.licenses
    }
}

impl Default for LicenseDb {
    fn default() -> Self {
        Self::new()
    }
}

fn build_database() -> Vec<LicenseDescriptor> {
    vec![
        // ── Permissive ──
        LicenseDescriptor {
            id: "MIT",
            spdx_patterns: &["MIT"],
            text_patterns: &[
                "MIT License",
                "Permission is hereby granted, free of charge, to any person obtaining a copy",
                "The above copyright notice and this permission notice shall be included",
                "THE SOFTWARE IS PROVIDED \"AS IS\", WITHOUT WARRANTY OF ANY KIND",
            ],
        },
        LicenseDescriptor {
            id: "ISC",
            spdx_patterns: &["ISC"],
            text_patterns: &[
                "ISC License",
                "Permission to use, copy, modify, and/or distribute this software for any",
                "purpose with or without fee is hereby granted",
                "THE SOFTWARE IS PROVIDED \"AS IS\" AND THE AUTHOR DISCLAIMS ALL WARRANTIES",
            ],
        },
        LicenseDescriptor {
            id: "BSD-2-Clause",
            spdx_patterns: &["BSD-2-Clause"],
            text_patterns: &[
                "Redistribution and use in source and binary forms, with or without",
                "Redistributions of source code must retain the above copyright",
                "Redistributions in binary form must reproduce the above copyright",
            ],
        },
        LicenseDescriptor {
            id: "BSD-3-Clause",
            spdx_patterns: &["BSD-3-Clause"],
            text_patterns: &[
                "Redistribution and use in source and binary forms, with or without",
                "Redistributions of source code must retain the above copyright",
                "Redistributions in binary form must reproduce the above copyright",
                "may be used to endorse or promote products derived from",
            ],
        },
        LicenseDescriptor {
            id: "Zlib",
            spdx_patterns: &["Zlib"],
            text_patterns: &[
                "This software is provided 'as-is', without any express or implied",
                "The origin of this software must not be misrepresented",
                "Altered source versions must be plainly marked as such",
            ],
        },
        LicenseDescriptor {
            id: "Apache-2.0",
            spdx_patterns: &["Apache-2.0"],
            text_patterns: &[
                "Apache License",
                "Version 2.0, January 2004",
                "http://www.apache.org/licenses/",
                "TERMS AND CONDITIONS FOR USE, REPRODUCTION, AND DISTRIBUTION",
                "Grant of Patent License",
            ],
        },
        // ── Weak copyleft ──
        LicenseDescriptor {
            id: "MPL-2.0",
            spdx_patterns: &["MPL-2.0"],
            text_patterns: &[
                "Mozilla Public License Version 2.0",
                "Mozilla Public License, v. 2.0",
                "\"Covered Software\" means",
            ],
        },
        LicenseDescriptor {
            id: "LGPL-2.1-only",
            spdx_patterns: &["LGPL-2.1-only", "LGPL-2.1"],
            text_patterns: &[
                "GNU LESSER GENERAL PUBLIC LICENSE",
                "Version 2.1, February 1999",
                "the Lesser GPL",
            ],
        },
        LicenseDescriptor {
            id: "LGPL-3.0-only",
            spdx_patterns: &["LGPL-3.0-only", "LGPL-3.0"],
            text_patterns: &[
                "GNU LESSER GENERAL PUBLIC LICENSE",
                "Version 3, 29 June 2007",
                "incorporates the terms and conditions of version 3 of the GNU General Public License",
            ],
        },
        // ── Strong copyleft ──
        LicenseDescriptor {
            id: "GPL-2.0-only",
            spdx_patterns: &["GPL-2.0-only", "GPL-2.0", "GPLv2"],
            text_patterns: &[
                "GNU GENERAL PUBLIC LICENSE",
                "Version 2, June 1991",
                "51 Franklin Street",
            ],
        },
        LicenseDescriptor {
            id: "GPL-3.0-only",
            spdx_patterns: &["GPL-3.0-only", "GPL-3.0", "GPLv3"],
            text_patterns: &[
                "GNU GENERAL PUBLIC LICENSE",
                "Version 3, 29 June 2007",
                "The GNU General Public License is a free, copyleft license",
            ],
        },
        LicenseDescriptor {
            id: "AGPL-3.0-only",
            spdx_patterns: &["AGPL-3.0-only", "AGPL-3.0", "AGPLv3"],
            text_patterns: &[
                "GNU AFFERO GENERAL PUBLIC LICENSE",
                "Version 3, 19 November 2007",
                "Remote Network Interaction",
            ],
        },
        // ── Public domain ──
        LicenseDescriptor {
            id: "Unlicense",
            spdx_patterns: &["Unlicense"],
            text_patterns: &[
                "This is free and unencumbered software released into the public domain",
                "For more information, please refer to <http://unlicense.org",
            ],
        },
        LicenseDescriptor {
            id: "CC0-1.0",
            spdx_patterns: &["CC0-1.0"],
            text_patterns: &[
                "CC0 1.0 Universal",
                "Statement of Purpose",
                "Waiver",
            ],
        },
    ]
}

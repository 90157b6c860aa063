/*!

This is the long-form manual for `seat_allocation` and `rollallot`.

## What a run does

1. The roster is sorted by application number, then by final submission time.
   Rows without a readable submission time come after the others for the same
   application number. Rows with identical keys keep their order from the file.
2. Roll numbers are handed out in that order, starting from `rollStart`
   (7100001 by default), without gaps.
3. Every row of the venue/lab table with a positive capacity becomes part of the
   pool. The usable capacity of a lab is `max(1, floor(capacity × bufferFraction))`.
4. Applicants are seated one at a time, in roll number order. Each applicant
   takes a seat in the first lab, in table order, of the earliest preferred
   district that still has room. Blank preferences are skipped. An applicant
   with no district left gets no seat ("Not Allotted").
5. Reports are computed from the final state.

The allotment is greedy: an earlier roll number always wins a contested seat,
even if a later applicant would have been happier with it. Nobody is moved after
being seated.

## Allocation modes

### `preference`

The default, described above.

### `rowOrder`

Preferences are ignored. Seats are handed out in the order of the venue table,
one lab after the other. In this mode, the run is refused if there are fewer
seats than applicants, and no output is written. The same check can be requested
in `preference` mode with `"strictCapacity": true`.

## Input formats

The following providers are supported for both tables:
* `csv` Comma Separated Values, with a header row
* `xlsx` Excel workbooks. The first row of the worksheet is the header. The
  worksheet is selected with `excelWorksheetName`, or the first one is used.

The columns are selected by the name in the header row. A missing column stops
the run before anything is computed.

Submission times may be Excel dates, or text such as `2024-01-15 10:30:00` or
`15-01-2024 10:30`. Dates that do not start with the year are read day first.
Anything else is treated as missing.

## Configuration file

The command line program reads a JSON file:

```text
{
  "outputSettings": {
    "runName": "Entrance test",       // required, used in the summary document
    "outputDirectory": "output",      // relative to the configuration file
    "generateSummaryDocument": true,
    "linesPerPage": 50
  },
  "applicantSource": {
    "provider": "csv",                // or "xlsx"
    "filePath": "applicants.csv",
    "excelWorksheetName": null,
    "idColumn": "ApplNo",
    "submissionTimeColumn": "FSubDate",
    "nameColumn": "Name",             // optional
    "preferenceColumns": ["Pref1", "Pref2", "Pref3"]
  },
  "venueSource": {
    "provider": "csv",
    "filePath": "labs.csv",
    "codeColumn": "Code",
    "venueNumberColumn": "Venue No",
    "centreNameColumn": "Centre Name",
    "labNameColumn": "Lab Name",
    "districtColumn": "District",
    "capacityColumn": "Strength"
  },
  "rules": {                          // optional, all keys optional
    "rollStart": 7100001,
    "bufferFraction": 1.0,            // in (0, 1]
    "allocationMode": "preference",   // or "rowOrder"
    "strictCapacity": false
  }
}
```

`--roll-start` and `--buffer-fraction` on the command line take precedence over
the `rules` section, and `--out` over `outputDirectory`.

## Outputs

All the outputs go to the output directory:
* `allotment.csv` the roster with roll numbers and venues
* `preference_summary.csv`, `district_summary.csv`, `venue_summary.csv`
* `not_allotted.csv`
* `attendance/` one attendance sheet per lab
* `summary.json` the summary in JSON format
* `summary.txt` a paginated summary document

*/

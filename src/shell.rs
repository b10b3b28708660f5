use crate::config::RowCountPolicy;
use crate::core::db::{ColumnSpec, Session, TableSpec};
use crate::core::validate::validate_value;
use crate::core::{CrudError, Result};
use std::io::{BufRead, Write};
use tracing::{debug, info};

/// An option chosen from the server-level menu.
#[derive(Debug, PartialEq)]
pub enum MainMenuOption {
    CreateDatabase,
    UseDatabase,
    Exit,
    Invalid(String),
}

/// Parses a server menu answer (`1`..`3`).
pub fn parse_main_option(input: &str) -> MainMenuOption {
    match input.trim() {
        "1" => MainMenuOption::CreateDatabase,
        "2" => MainMenuOption::UseDatabase,
        "3" => MainMenuOption::Exit,
        other => MainMenuOption::Invalid(other.to_string()),
    }
}

/// An option chosen from the table operations menu.
#[derive(Debug, PartialEq)]
pub enum TableMenuOption {
    CreateTable,
    InsertData,
    UpdateData,
    DeleteRow,
    DeleteColumn,
    DeleteTable,
    AddColumn,
    Return,
    Invalid(String),
}

/// Parses a table menu answer (`1`..`8`).
pub fn parse_table_option(input: &str) -> TableMenuOption {
    match input.trim() {
        "1" => TableMenuOption::CreateTable,
        "2" => TableMenuOption::InsertData,
        "3" => TableMenuOption::UpdateData,
        "4" => TableMenuOption::DeleteRow,
        "5" => TableMenuOption::DeleteColumn,
        "6" => TableMenuOption::DeleteTable,
        "7" => TableMenuOption::AddColumn,
        "8" => TableMenuOption::Return,
        other => TableMenuOption::Invalid(other.to_string()),
    }
}

/// Where the shell currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellState {
    Disconnected,
    ServerMenu,
    TableMenu,
}

/// Whether the operator is still there after a prompt sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    /// Input ended; unwind every menu
    Quit,
}

const MAIN_MENU: &str = "\nOptions:\n\
1. Create a new database\n\
2. Use an existing database\n\
3. Exit";

const TABLE_MENU: &str = "\nTable Operations:\n\
1. Create a new table\n\
2. Insert data into an existing table\n\
3. Update the table\n\
4. Delete a row\n\
5. Delete a column\n\
6. Delete the table\n\
7. Add a new column\n\
8. Return to the main menu";

/// The two-level prompt loop driving a `Session`.
///
/// Input and output are generic so the whole dialogue can be scripted.
/// End of input is treated as choosing Exit.
pub struct Shell<R, W> {
    session: Session,
    input: R,
    output: W,
    row_count_policy: RowCountPolicy,
    state: ShellState,
}

impl<R: BufRead, W: Write> Shell<R, W> {
    pub fn new(session: Session, input: R, output: W, row_count_policy: RowCountPolicy) -> Self {
        Shell {
            session,
            input,
            output,
            row_count_policy,
            state: ShellState::Disconnected,
        }
    }

    pub fn state(&self) -> ShellState {
        self.state
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Consumes the shell, returning the session and the output sink.
    pub fn into_parts(self) -> (Session, W) {
        (self.session, self.output)
    }

    /// Connects to the server and runs the menus until the operator exits.
    ///
    /// # Errors
    ///
    /// The connection error if the server cannot be reached, or an I/O error
    /// from the console. Operation failures are printed, never returned.
    pub fn run(&mut self) -> Result<()> {
        if let Err(e) = self.session.connect_to_server() {
            writeln!(self.output, "{}", e)?;
            writeln!(self.output, "Could not connect to server.")?;
            return Err(e);
        }
        writeln!(self.output, "Connected successfully.")?;
        self.state = ShellState::ServerMenu;

        loop {
            writeln!(self.output, "{}", MAIN_MENU)?;
            let Some(choice) = self.prompt("Enter your choice: ")? else {
                break;
            };

            let flow = match parse_main_option(&choice) {
                MainMenuOption::CreateDatabase => self.create_database()?,
                MainMenuOption::UseDatabase => self.use_database()?,
                MainMenuOption::Exit => break,
                MainMenuOption::Invalid(other) => {
                    debug!("Invalid main menu choice {:?}", other);
                    writeln!(self.output, "Invalid option. Please choose again.")?;
                    Flow::Continue
                }
            };
            if flow == Flow::Quit {
                break;
            }
        }

        writeln!(self.output, "Exiting the program.")?;
        Ok(())
    }

    fn create_database(&mut self) -> Result<Flow> {
        let Some(name) = self.prompt("Enter the name of the database to create: ")? else {
            return Ok(Flow::Quit);
        };
        match self.session.create_database(&name) {
            Ok(()) => writeln!(self.output, "Database {} created successfully!", name)?,
            Err(e) => {
                self.report_failure("Error creating database", e)?;
                return Ok(Flow::Continue);
            }
        }
        match self.session.connect_to_db(&name) {
            Ok(()) => {
                writeln!(self.output, "Connected successfully.")?;
                self.table_menu()
            }
            Err(e) => {
                writeln!(self.output, "{}", e)?;
                Ok(Flow::Continue)
            }
        }
    }

    fn use_database(&mut self) -> Result<Flow> {
        let Some(name) = self.prompt("Enter the name of the database to connect to: ")? else {
            return Ok(Flow::Quit);
        };
        match self.session.connect_to_db(&name) {
            Ok(()) => {
                writeln!(self.output, "Connected successfully.")?;
                self.table_menu()
            }
            Err(e) => {
                info!("Cannot connect to database {}: {}", name, e);
                writeln!(self.output, "{}", e)?;
                writeln!(
                    self.output,
                    "Cannot connect to database '{}'. Please check the database name and try again.",
                    name
                )?;
                Ok(Flow::Continue)
            }
        }
    }

    fn table_menu(&mut self) -> Result<Flow> {
        self.state = ShellState::TableMenu;
        let flow = loop {
            writeln!(self.output, "{}", TABLE_MENU)?;
            let Some(choice) = self.prompt("Enter the option: ")? else {
                break Flow::Quit;
            };

            let flow = match parse_table_option(&choice) {
                TableMenuOption::CreateTable => self.create_table()?,
                TableMenuOption::InsertData => self.insert_data()?,
                TableMenuOption::UpdateData => self.update_data()?,
                TableMenuOption::DeleteRow => self.delete_row()?,
                TableMenuOption::DeleteColumn => self.delete_column()?,
                TableMenuOption::DeleteTable => self.delete_table()?,
                TableMenuOption::AddColumn => self.add_column()?,
                TableMenuOption::Return => break Flow::Continue,
                TableMenuOption::Invalid(other) => {
                    debug!("Invalid table menu choice {:?}", other);
                    writeln!(self.output, "Invalid option. Please choose again.")?;
                    Flow::Continue
                }
            };
            if flow == Flow::Quit {
                break Flow::Quit;
            }
        };
        self.state = ShellState::ServerMenu;
        Ok(flow)
    }

    /// Collects a table name and columns until the operator declines another.
    fn read_table_spec(&mut self) -> Result<Option<TableSpec>> {
        let Some(name) = self.prompt("Enter the table name: ")? else {
            return Ok(None);
        };
        let mut columns = Vec::new();
        loop {
            let Some(column) = self.prompt("Enter column name: ")? else {
                return Ok(None);
            };
            let Some(data_type) = self.prompt("Enter data type (e.g., INT, VARCHAR(50)): ")? else {
                return Ok(None);
            };
            columns.push(ColumnSpec::new(column, data_type));
            let Some(another) = self.prompt("Add another column? (y/n): ")? else {
                return Ok(None);
            };
            if !another.eq_ignore_ascii_case("y") {
                break;
            }
        }
        Ok(Some(TableSpec::new(name, columns)))
    }

    fn create_table(&mut self) -> Result<Flow> {
        let Some(spec) = self.read_table_spec()? else {
            return Ok(Flow::Quit);
        };
        match self.session.create_table(&spec) {
            Ok(()) => writeln!(self.output, "Table {} created successfully.", spec.name)?,
            Err(e) => self.report_failure("Error creating table", e)?,
        }
        Ok(Flow::Continue)
    }

    fn insert_data(&mut self) -> Result<Flow> {
        let Some(table) = self.prompt("Enter the name of the table to insert data into: ")? else {
            return Ok(Flow::Quit);
        };
        match self.insert_rows(&table) {
            Ok(Flow::Continue) => writeln!(self.output, "Data inserted successfully.")?,
            Ok(Flow::Quit) => return Ok(Flow::Quit),
            Err(e) => self.report_failure("Error inserting data", e)?,
        }
        Ok(Flow::Continue)
    }

    /// Prompts for each value of each row, checking every value against the
    /// column's declared type fetched fresh from the catalog.
    ///
    /// A value that fails validation is asked for again; a catalog or
    /// statement failure abandons the remaining rows.
    fn insert_rows(&mut self, table: &str) -> Result<Flow> {
        let columns = self.session.column_names(table)?;
        let Some(row_count) = self.read_row_count()? else {
            return Ok(Flow::Quit);
        };

        for _ in 0..row_count {
            let mut values = Vec::with_capacity(columns.len());
            for column in &columns {
                loop {
                    let Some(value) = self.prompt_raw(&format!("Enter value for {}: ", column))?
                    else {
                        return Ok(Flow::Quit);
                    };
                    let declared = self.session.column_type(table, column)?;
                    match validate_value(&value, &declared) {
                        Ok(()) => {
                            values.push(value);
                            break;
                        }
                        Err(e) => writeln!(self.output, "{}", e)?,
                    }
                }
            }
            self.session.insert_row(table, &columns, &values)?;
        }
        Ok(Flow::Continue)
    }

    fn read_row_count(&mut self) -> Result<Option<usize>> {
        loop {
            let Some(answer) = self.prompt("Enter the number of rows to insert: ")? else {
                return Ok(None);
            };
            match answer.parse::<usize>() {
                Ok(count) => return Ok(Some(count)),
                Err(_) => match self.row_count_policy {
                    RowCountPolicy::Reprompt => {
                        writeln!(self.output, "{}", CrudError::InvalidRowCount(answer))?;
                    }
                    RowCountPolicy::Abort => return Err(CrudError::InvalidRowCount(answer)),
                },
            }
        }
    }

    fn update_data(&mut self) -> Result<Flow> {
        let Some(table) = self.prompt("Enter the name of the table to update: ")? else {
            return Ok(Flow::Quit);
        };
        let Some(column) = self.prompt("Enter the column name to update: ")? else {
            return Ok(Flow::Quit);
        };
        let Some(value) = self.prompt_raw("Enter the new value: ")? else {
            return Ok(Flow::Quit);
        };
        let Some(condition) = self.prompt("Enter the condition (e.g., id = 1): ")? else {
            return Ok(Flow::Quit);
        };
        match self.session.update_data(&table, &column, &value, &condition) {
            Ok(changed) => writeln!(
                self.output,
                "Data updated successfully. {} row(s) affected.",
                changed
            )?,
            Err(e) => self.report_failure("Error updating data", e)?,
        }
        Ok(Flow::Continue)
    }

    fn delete_row(&mut self) -> Result<Flow> {
        let Some(table) = self.prompt("Enter the name of the table to delete a row from: ")? else {
            return Ok(Flow::Quit);
        };
        let Some(condition) = self.prompt("Enter the condition to delete (e.g., id = 1): ")? else {
            return Ok(Flow::Quit);
        };
        match self.session.delete_row(&table, &condition) {
            Ok(changed) => writeln!(
                self.output,
                "Row deleted successfully. {} row(s) affected.",
                changed
            )?,
            Err(e) => self.report_failure("Error deleting row", e)?,
        }
        Ok(Flow::Continue)
    }

    fn delete_column(&mut self) -> Result<Flow> {
        let Some(table) =
            self.prompt("Enter the name of the table to delete a column from: ")?
        else {
            return Ok(Flow::Quit);
        };
        let Some(column) = self.prompt("Enter the column name to delete: ")? else {
            return Ok(Flow::Quit);
        };
        match self.session.delete_column(&table, &column) {
            Ok(()) => writeln!(self.output, "Column {} deleted successfully.", column)?,
            Err(e) => self.report_failure("Error deleting column", e)?,
        }
        Ok(Flow::Continue)
    }

    fn delete_table(&mut self) -> Result<Flow> {
        let Some(table) = self.prompt("Enter the name of the table to delete: ")? else {
            return Ok(Flow::Quit);
        };
        match self.session.delete_table(&table) {
            Ok(()) => writeln!(self.output, "Table {} deleted successfully.", table)?,
            Err(e) => self.report_failure("Error deleting table", e)?,
        }
        Ok(Flow::Continue)
    }

    fn add_column(&mut self) -> Result<Flow> {
        let Some(table) =
            self.prompt("Enter the name of the table to add a new column to: ")?
        else {
            return Ok(Flow::Quit);
        };
        let Some(column) = self.prompt("Enter the column name to add: ")? else {
            return Ok(Flow::Quit);
        };
        let Some(data_type) = self.prompt("Enter the data type of the new column: ")? else {
            return Ok(Flow::Quit);
        };
        match self.session.add_column(&table, &column, &data_type) {
            Ok(()) => writeln!(self.output, "Column {} added successfully.", column)?,
            Err(e) => self.report_failure("Error adding column", e)?,
        }
        Ok(Flow::Continue)
    }

    /// Prints an operation failure. Console errors are passed back up since
    /// the dialogue cannot continue without a console.
    ///
    /// These are operator mistakes already shown on stdout, so they are
    /// logged below the default level.
    fn report_failure(&mut self, context: &str, err: CrudError) -> Result<()> {
        debug!("{}: {}", context, err);
        match err {
            CrudError::Io(_) => Err(err),
            CrudError::TableNotFound(_) => {
                writeln!(self.output, "{}", err)?;
                Ok(())
            }
            _ => {
                writeln!(self.output, "{}: {}", context, err)?;
                Ok(())
            }
        }
    }

    /// Prompts and returns the trimmed answer, `None` at end of input.
    fn prompt(&mut self, label: &str) -> Result<Option<String>> {
        Ok(self.prompt_raw(label)?.map(|s| s.trim().to_string()))
    }

    /// Prompts and returns the answer without its line ending.
    fn prompt_raw(&mut self, label: &str) -> Result<Option<String>> {
        write!(self.output, "{}", label)?;
        self.output.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\n', '\r']).to_string()))
    }
}

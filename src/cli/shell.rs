//! An interactive session over one in-memory roster.
//!
//! Each input line is split into words and parsed with clap, so every
//! command accepts the same flags as its top-level counterpart.

use std::{
    io::{self, BufRead, Write},
    str::FromStr,
};

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use rand_chacha::ChaCha8Rng;
use roster::{
    ClassPosition, Config, DataDir, DegreeId, MatterId, RelationshipId, Store, StudentGenerator,
    StudentId, TeacherId,
    domain::{RelationshipDraft, StudentDraft},
};
use tracing::instrument;

use super::{
    chart::Chart, generator_rng, name_or_placeholder, relationships::Relationships,
    relationships::describe_grades, students::Students, terminal::Colorize, validate::Validate,
};

const PROMPT: &str = "school> ";

#[derive(Debug, Parser)]
#[command(about = "Start an interactive session that can edit the roster")]
pub struct Shell {
    /// Skip confirmation prompts for deletions
    #[arg(long, short)]
    yes: bool,
}

impl Shell {
    #[instrument(level = "debug", skip_all)]
    pub fn run(self, data: &DataDir) -> anyhow::Result<()> {
        let store = data.load()?;
        let config = data.config();
        let mut session = Session::new(store, &config, self.yes);

        let stdin = io::stdin();
        let mut stdout = io::stdout();
        let mut lines = stdin.lock().lines();

        loop {
            write!(stdout, "{PROMPT}")?;
            stdout.flush()?;

            let Some(line) = lines.next() else {
                writeln!(stdout)?;
                break;
            };

            match session.execute(&line?, &mut stdout) {
                Ok(Flow::Continue) => {}
                Ok(Flow::Quit) => break,
                Err(e) => eprintln!("{}", format!("error: {e:#}").warning()),
            }
        }

        Ok(())
    }
}

/// What the input loop does after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// The state of one interactive session.
pub struct Session {
    store: Store,
    config: Config,
    generator: StudentGenerator,
    rng: ChaCha8Rng,
    assume_yes: bool,
}

impl Session {
    pub fn new(mut store: Store, config: &Config, assume_yes: bool) -> Self {
        store.subscribe(|snapshot| {
            tracing::debug!(
                revision = snapshot.revision(),
                students = snapshot.students().len(),
                relationships = snapshot.relationships().len(),
                "roster changed"
            );
        });

        Self {
            store,
            config: config.clone(),
            generator: StudentGenerator::new(config.generated_label()),
            rng: generator_rng(config),
            assume_yes,
        }
    }

    #[cfg(test)]
    const fn store(&self) -> &Store {
        &self.store
    }

    /// Parses and runs one input line.
    ///
    /// Usage errors and help requests are written to `out` rather than
    /// returned, so a typo does not end the session.
    ///
    /// # Errors
    ///
    /// Returns an error if the command itself fails.
    pub fn execute(&mut self, line: &str, out: &mut impl Write) -> anyhow::Result<Flow> {
        let words = split_words(line)?;
        if words.is_empty() {
            return Ok(Flow::Continue);
        }

        let command = match ShellLine::try_parse_from(words) {
            Ok(parsed) => parsed.command,
            Err(e) => {
                write!(out, "{}", e.render())?;
                return Ok(Flow::Continue);
            }
        };

        match command {
            ShellCommand::Students(command) => command.render(&self.store, &self.config, out)?,
            ShellCommand::Relationships(command) => command.render(&self.store, out)?,
            ShellCommand::Chart(command) => command.render(&self.store, out)?,
            ShellCommand::Validate(command) => {
                command.render(&self.store, out)?;
            }
            ShellCommand::Show { id } => self.show(id, out)?,
            ShellCommand::EditStudent(edit) => self.edit_student(edit, out)?,
            ShellCommand::DeleteStudent { id } => self.delete_student(id, out)?,
            ShellCommand::Generate => self.generate(out)?,
            ShellCommand::AddRelationship(fields) => self.add_relationship(fields, out)?,
            ShellCommand::EditRelationship {
                id,
                fields,
                remove_grades,
            } => {
                self.edit_relationship(id, fields, &remove_grades, out)?;
            }
            ShellCommand::DeleteRelationship { id } => self.delete_relationship(id, out)?,
            ShellCommand::Quit => return Ok(Flow::Quit),
        }

        Ok(Flow::Continue)
    }

    fn show(&self, id: StudentId, out: &mut impl Write) -> anyhow::Result<()> {
        let student = self
            .store
            .student(id)
            .with_context(|| format!("no student with id {id}"))?;
        let catalog = self.store.catalog();

        writeln!(out, "{}", format!("Student {id}").info())?;
        writeln!(out, "  Name:    {}", student.name)?;
        writeln!(out, "  RA:      {}", student.ra)?;
        writeln!(
            out,
            "  Degree:  {}",
            name_or_placeholder(catalog.degree_name(student.degree_id))
        )?;
        writeln!(
            out,
            "  Class:   {}",
            name_or_placeholder(catalog.class_name(student.class_id))
        )?;

        let taught_by: Vec<String> = self
            .store
            .relationships()
            .iter()
            .filter(|relationship| {
                relationship.degrees.iter().any(|entry| {
                    entry.degree_id == student.degree_id && entry.includes(student.class_id)
                })
            })
            .map(|relationship| {
                format!(
                    "{} ({})",
                    name_or_placeholder(catalog.teacher_name(relationship.teacher_id)),
                    name_or_placeholder(catalog.matter_name(relationship.matter_id))
                )
            })
            .collect();

        if taught_by.is_empty() {
            writeln!(out, "  Taught by: {}", "nobody".dim())?;
        } else {
            writeln!(out, "  Taught by:")?;
            for line in taught_by {
                writeln!(out, "    {line}")?;
            }
        }

        Ok(())
    }

    fn edit_student(&mut self, edit: EditStudent, out: &mut impl Write) -> anyhow::Result<()> {
        let student = self
            .store
            .student(edit.id)
            .with_context(|| format!("no student with id {}", edit.id))?;

        let mut draft = StudentDraft::from(student);
        if let Some(name) = edit.name {
            draft.name = name;
        }
        if let Some(degree) = edit.degree {
            draft.degree = Some(degree);
        }
        if let Some(class) = edit.class {
            draft.class = Some(class);
        }

        let updated = draft.finish()?;
        self.store.update_student(updated);
        writeln!(out, "{}", format!("✓ Updated student {}", edit.id).success())?;
        Ok(())
    }

    fn delete_student(&mut self, id: StudentId, out: &mut impl Write) -> anyhow::Result<()> {
        let name = self
            .store
            .student(id)
            .map(|student| student.name.clone())
            .with_context(|| format!("no student with id {id}"))?;

        if !self.confirm(&format!("Delete student {id} ({name})?"))? {
            writeln!(out, "Cancelled")?;
            return Ok(());
        }

        self.store.delete_student(id);
        writeln!(out, "{}", format!("✓ Deleted student {id}").success())?;
        Ok(())
    }

    fn generate(&mut self, out: &mut impl Write) -> anyhow::Result<()> {
        let batch = self
            .store
            .generate_students(&self.generator, &mut self.rng)?;

        let message = match (batch.first(), batch.last()) {
            (Some(first), Some(last)) => format!(
                "✓ Generated {} students (ids {}..={})",
                batch.len(),
                first.id,
                last.id
            ),
            _ => "No students generated".to_string(),
        };
        writeln!(out, "{}", message.success())?;
        Ok(())
    }

    fn add_relationship(
        &mut self,
        fields: RelationshipFields,
        out: &mut impl Write,
    ) -> anyhow::Result<()> {
        let mut draft = RelationshipDraft::default();
        fields.apply(&mut draft);

        let relationship = draft.finish(self.store.next_relationship_id())?;
        let id = relationship.id;
        self.store.add_relationship(relationship);
        writeln!(out, "{}", format!("✓ Added relationship {id}").success())?;
        Ok(())
    }

    fn edit_relationship(
        &mut self,
        id: RelationshipId,
        fields: RelationshipFields,
        remove_grades: &[DegreeId],
        out: &mut impl Write,
    ) -> anyhow::Result<()> {
        let existing = self
            .store
            .relationship(id)
            .with_context(|| format!("no relationship with id {id}"))?;

        let mut draft = RelationshipDraft::from(existing);
        fields.apply(&mut draft);
        for &degree in remove_grades {
            if !draft.remove_grade(degree) {
                bail!("relationship {id} does not cover degree {degree}");
            }
        }

        let updated = draft.finish(id)?;
        let summary = describe_grades(self.store.catalog(), &updated.degrees);
        self.store.update_relationship(updated);
        writeln!(
            out,
            "{}",
            format!("✓ Updated relationship {id}: {summary}").success()
        )?;
        Ok(())
    }

    fn delete_relationship(&mut self, id: RelationshipId, out: &mut impl Write) -> anyhow::Result<()> {
        if self.store.relationship(id).is_none() {
            bail!("no relationship with id {id}");
        }

        if !self.confirm(&format!("Delete relationship {id}?"))? {
            writeln!(out, "Cancelled")?;
            return Ok(());
        }

        self.store.delete_relationship(id);
        writeln!(out, "{}", format!("✓ Deleted relationship {id}").success())?;
        Ok(())
    }

    fn confirm(&self, prompt: &str) -> anyhow::Result<bool> {
        if self.assume_yes {
            return Ok(true);
        }

        dialoguer::Confirm::new()
            .with_prompt(prompt)
            .default(false)
            .interact()
            .context("failed to read confirmation (use --yes to skip it)")
    }
}

#[derive(Debug, Parser)]
#[command(no_binary_name = true, disable_version_flag = true)]
struct ShellLine {
    #[command(subcommand)]
    command: ShellCommand,
}

#[derive(Debug, Subcommand)]
enum ShellCommand {
    /// List students
    Students(Students),

    /// List teaching assignments
    Relationships(Relationships),

    /// Show the number of students per degree as a bar chart
    Chart(Chart),

    /// Check the roster for dangling references and duplicate ids
    Validate(Validate),

    /// Show one student and who teaches them
    Show {
        /// The student's id
        id: StudentId,
    },

    /// Change a student's name, degree or class
    EditStudent(EditStudent),

    /// Remove a student
    DeleteStudent {
        /// The student's id
        id: StudentId,
    },

    /// Enroll a batch of generated students
    Generate,

    /// Create a teaching assignment
    AddRelationship(RelationshipFields),

    /// Change a teaching assignment
    ///
    /// Any --grade replaces all of the assignment's grades.
    EditRelationship {
        /// The assignment's id
        id: RelationshipId,

        #[command(flatten)]
        fields: RelationshipFields,

        /// Stop teaching in this degree (repeatable)
        #[arg(long = "remove-grade", value_name = "DEGREE")]
        remove_grades: Vec<DegreeId>,
    },

    /// Remove a teaching assignment
    DeleteRelationship {
        /// The assignment's id
        id: RelationshipId,
    },

    /// End the session
    #[command(alias = "exit")]
    Quit,
}

#[derive(Debug, clap::Args)]
struct EditStudent {
    /// The student's id
    id: StudentId,

    /// New name
    #[arg(long)]
    name: Option<String>,

    /// New degree (by id)
    #[arg(long, value_name = "ID")]
    degree: Option<DegreeId>,

    /// New class (by position, starting at 1)
    #[arg(long, value_name = "N")]
    class: Option<ClassPosition>,
}

#[derive(Debug, clap::Args)]
struct RelationshipFields {
    /// The teacher (by id)
    #[arg(long, value_name = "ID")]
    teacher: Option<TeacherId>,

    /// The subject (by id)
    #[arg(long, value_name = "ID")]
    matter: Option<MatterId>,

    /// A degree and its classes, e.g. `1:1,2` (repeatable)
    #[arg(long = "grade", value_name = "DEGREE:CLASSES")]
    grades: Vec<Grade>,
}

impl RelationshipFields {
    fn apply(self, draft: &mut RelationshipDraft) {
        if self.teacher.is_some() {
            draft.teacher = self.teacher;
        }
        if self.matter.is_some() {
            draft.matter = self.matter;
        }
        if !self.grades.is_empty() {
            draft.grades.clear();
            for grade in self.grades {
                draft.add_grade(grade.degree, grade.classes);
            }
        }
    }
}

/// A degree with the classes covered in it, written `DEGREE:CLASS[,CLASS...]`.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Grade {
    degree: DegreeId,
    classes: Vec<ClassPosition>,
}

impl FromStr for Grade {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (degree, classes) = s
            .split_once(':')
            .ok_or_else(|| format!("expected DEGREE:CLASSES, got '{s}'"))?;

        let degree = degree
            .parse::<DegreeId>()
            .map_err(|e| format!("invalid degree '{degree}': {e}"))?;
        let classes = classes
            .split(',')
            .filter(|class| !class.trim().is_empty())
            .map(|class| class.parse::<ClassPosition>().map_err(|e| e.to_string()))
            .collect::<Result<_, _>>()?;

        Ok(Self { degree, classes })
    }
}

/// Splits a line into words, honouring single and double quotes.
fn split_words(line: &str) -> anyhow::Result<Vec<String>> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut quote: Option<char> = None;

    for c in line.chars() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => current.push(c),
            None if c == '"' || c == '\'' => {
                quote = Some(c);
                in_word = true;
            }
            None if c.is_whitespace() => {
                if in_word {
                    words.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            None => {
                current.push(c);
                in_word = true;
            }
        }
    }

    if quote.is_some() {
        bail!("unterminated quote");
    }
    if in_word {
        words.push(current);
    }

    Ok(words)
}

#[cfg(test)]
mod tests {
    use roster::{
        Catalog, Class, Degree, DegreeAssignment, Matter, Ra, Relationship, Student, Teacher,
    };
    use test_case::test_case;

    use super::*;

    fn position(value: u32) -> ClassPosition {
        ClassPosition::new(value).unwrap()
    }

    fn session() -> Session {
        let catalog = Catalog::new(
            vec![
                Degree {
                    id: DegreeId::new(1),
                    name: "1ª Série".to_string(),
                },
                Degree {
                    id: DegreeId::new(2),
                    name: "2ª Série".to_string(),
                },
            ],
            vec![
                Class {
                    name: "Classe A".to_string(),
                },
                Class {
                    name: "Classe B".to_string(),
                },
            ],
            vec![Teacher {
                id: TeacherId::new(1),
                name: "Helena".to_string(),
            }],
            vec![Matter {
                id: MatterId::new(1),
                name: "Matemática".to_string(),
            }],
        );
        let students = vec![Student {
            id: StudentId::new(1),
            name: "Ana".to_string(),
            ra: Ra::new(123_456),
            degree_id: DegreeId::new(1),
            class_id: position(1),
        }];
        let relationships = vec![Relationship {
            id: RelationshipId::new(1),
            teacher_id: TeacherId::new(1),
            matter_id: MatterId::new(1),
            degrees: vec![DegreeAssignment::new(DegreeId::new(1), [position(1)])],
        }];

        let mut config = Config::default();
        config.seed = Some(5);
        Session::new(Store::new(catalog, students, relationships), &config, true)
    }

    fn run(session: &mut Session, line: &str) -> String {
        let mut out = Vec::new();
        let flow = session.execute(line, &mut out).unwrap();
        assert_eq!(flow, Flow::Continue);
        String::from_utf8(out).unwrap()
    }

    #[test_case("students --quiet", &["students", "--quiet"] ; "plain words")]
    #[test_case("  show   3 ", &["show", "3"] ; "extra whitespace")]
    #[test_case(r#"edit-student 1 --name "Ana Clara""#, &["edit-student", "1", "--name", "Ana Clara"] ; "double quotes")]
    #[test_case("edit-student 1 --name 'D''Ávila'", &["edit-student", "1", "--name", "DÁvila"] ; "adjacent quotes join")]
    #[test_case(r#"x """#, &["x", ""] ; "empty quoted word")]
    fn splits_words(line: &str, expected: &[&str]) {
        assert_eq!(split_words(line).unwrap(), expected);
    }

    #[test]
    fn unterminated_quote_is_an_error() {
        assert!(split_words(r#"edit-student 1 --name "Ana"#).is_err());
    }

    #[test_case("1:1,2", 1, &[1, 2] ; "two classes")]
    #[test_case("3:4", 3, &[4] ; "one class")]
    #[test_case("2:", 2, &[] ; "no classes")]
    fn parses_grades(input: &str, degree: u32, classes: &[u32]) {
        let grade: Grade = input.parse().unwrap();
        assert_eq!(grade.degree, DegreeId::new(degree));
        assert_eq!(
            grade.classes,
            classes.iter().map(|&c| position(c)).collect::<Vec<_>>()
        );
    }

    #[test_case("1" ; "missing separator")]
    #[test_case("x:1" ; "bad degree")]
    #[test_case("1:0" ; "zero class")]
    fn rejects_malformed_grades(input: &str) {
        assert!(input.parse::<Grade>().is_err());
    }

    #[test]
    fn blank_lines_and_quit() {
        let mut session = session();
        assert_eq!(run(&mut session, "   "), "");
        assert_eq!(
            session.execute("quit", &mut Vec::new()).unwrap(),
            Flow::Quit
        );
        assert_eq!(
            session.execute("exit", &mut Vec::new()).unwrap(),
            Flow::Quit
        );
    }

    #[test]
    fn unknown_command_prints_usage_and_continues() {
        let mut session = session();
        let output = run(&mut session, "frobnicate");
        assert!(output.contains("frobnicate"));
    }

    #[test]
    fn edits_a_student() {
        let mut session = session();
        let output = run(&mut session, r#"edit-student 1 --name "Ana Clara" --class 2"#);
        assert!(output.contains("Updated student 1"));

        let student = session.store().student(StudentId::new(1)).unwrap();
        assert_eq!(student.name, "Ana Clara");
        assert_eq!(student.class_id, position(2));
        assert_eq!(student.ra, Ra::new(123_456));
    }

    #[test]
    fn blank_name_is_rejected() {
        let mut session = session();
        let error = session
            .execute(r#"edit-student 1 --name "  ""#, &mut Vec::new())
            .unwrap_err();
        assert!(error.to_string().contains("name is missing"));
        assert_eq!(session.store().students()[0].name, "Ana");
    }

    #[test]
    fn shows_who_teaches_a_student() {
        let mut session = session();
        let output = run(&mut session, "show 1");
        assert!(output.contains("Helena (Matemática)"));
        assert!(output.contains("Classe A"));

        assert!(session.execute("show 9", &mut Vec::new()).is_err());
    }

    #[test]
    fn deletes_with_assumed_confirmation() {
        let mut session = session();
        run(&mut session, "delete-student 1");
        assert!(session.store().students().is_empty());

        run(&mut session, "delete-relationship 1");
        assert!(session.store().relationships().is_empty());
        assert!(session.execute("delete-relationship 1", &mut Vec::new()).is_err());
    }

    #[test]
    fn generates_a_batch() {
        let mut session = session();
        let output = run(&mut session, "generate");

        assert!(output.contains("Generated 300 students (ids 2..=301)"));
        assert_eq!(session.store().students().len(), 301);
        assert_eq!(session.store().students()[1].name, "Aluno Gerado 2");
    }

    #[test]
    fn adds_a_relationship_with_the_next_id() {
        let mut session = session();
        let output = run(
            &mut session,
            "add-relationship --teacher 1 --matter 1 --grade 1:1,2 --grade 2:1",
        );
        assert!(output.contains("Added relationship 2"));

        let added = session.store().relationship(RelationshipId::new(2)).unwrap();
        assert_eq!(added.degrees.len(), 2);
        assert!(added.covers_degree(DegreeId::new(2)));
    }

    #[test]
    fn incomplete_relationship_is_rejected() {
        let mut session = session();

        let error = session
            .execute("add-relationship --teacher 1 --grade 1:1", &mut Vec::new())
            .unwrap_err();
        assert!(error.to_string().contains("matter is missing"));

        let error = session
            .execute("add-relationship --teacher 1 --matter 1", &mut Vec::new())
            .unwrap_err();
        assert!(error.to_string().contains("at least one grade"));

        assert_eq!(session.store().relationships().len(), 1);
    }

    #[test]
    fn editing_grades_replaces_them() {
        let mut session = session();
        let output = run(&mut session, "edit-relationship 1 --grade 2:2");
        assert!(output.contains("2ª Série (Classe B)"));

        let edited = session.store().relationship(RelationshipId::new(1)).unwrap();
        assert!(!edited.covers_degree(DegreeId::new(1)));
        assert_eq!(edited.teacher_id, TeacherId::new(1));
    }

    #[test]
    fn removing_a_grade_keeps_the_others() {
        let mut session = session();
        run(&mut session, "edit-relationship 1 --grade 1:1 --grade 2:1,2");

        let output = run(&mut session, "edit-relationship 1 --remove-grade 1");
        assert!(output.contains("2ª Série (Classe A, Classe B)"));
        let edited = session.store().relationship(RelationshipId::new(1)).unwrap();
        assert!(!edited.covers_degree(DegreeId::new(1)));
        assert!(edited.covers_degree(DegreeId::new(2)));

        let error = session
            .execute("edit-relationship 1 --remove-grade 1", &mut Vec::new())
            .unwrap_err();
        assert!(error.to_string().contains("does not cover degree 1"));

        let error = session
            .execute("edit-relationship 1 --remove-grade 2", &mut Vec::new())
            .unwrap_err();
        assert!(error.to_string().contains("at least one grade"));
        assert!(session
            .store()
            .relationship(RelationshipId::new(1))
            .unwrap()
            .covers_degree(DegreeId::new(2)));
    }

    #[test]
    fn listing_commands_share_top_level_flags() {
        let mut session = session();
        let output = run(&mut session, "students --degree 1 --quiet");
        assert_eq!(output, "1\t123456\tAna\t1ª Série\tClasse A\n");

        let output = run(&mut session, "validate --output json");
        assert!(output.contains("healthy"));
    }
}
